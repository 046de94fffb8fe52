//! Configure a simulated module and print its register block

use redpitaya_osc::prelude::*;

fn main() -> anyhow::Result<()> {
    let mut osc = Osc::new(Mock::new(), InputRange::Lv)?;
    osc.decimation.set_decimation(1024)?;
    osc.decimation.set_average(true)?;
    osc.trigger.set_edge(TriggerEdge::Negative)?;
    osc.trigger.set_level(Levels {
        negative: -0.5,
        positive: 0.25,
    })?;
    osc.set_input_range(InputRange::Hv)?;
    println!("{}", osc.regset.dump()?);
    Ok(())
}
