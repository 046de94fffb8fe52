//! In this example, we open the first oscilloscope module, arm a positive edge trigger at 100 mV
//! and print the samples around the trigger.

use redpitaya_osc::prelude::*;
use std::{
    thread::sleep,
    time::Duration,
};

fn main() -> anyhow::Result<()> {
    let osc = Osc::open(0, InputRange::Lv)?;

    osc.acquisition.reset()?;
    osc.decimation.set_decimation(8)?;
    osc.decimation.set_average(true)?;
    // Trigger on the rising edge of channel A
    osc.trigger.set_mask(Mask {
        trigger: 1 << 2,
        ..Default::default()
    })?;
    osc.trigger.set_edge("pos".parse()?)?;
    osc.trigger.set_level(Levels {
        negative: 0.09,
        positive: 0.1,
    })?;
    osc.trigger.set_pre(10e-6)?;
    osc.trigger.set_post(20e-6)?;

    osc.acquisition.start()?;
    while osc.acquisition.is_running()? {
        sleep(Duration::from_millis(1));
    }

    let size = (osc.trigger.pre_count()? + osc.trigger.post_count()?) as usize;
    for (i, v) in osc.buffer.data(size, None)?.iter().enumerate() {
        println!("{i}\t{v:.6}");
    }
    Ok(())
}
