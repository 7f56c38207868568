mod config;
mod demos;

use std::env;

use anyhow::Context;
use log::{info, warn};
use machine_learning::training::StopFlag;
use tokio::{signal, task};

use config::PlaygroundConfig;
use demos::Demo;

const USAGE: &str = "usage: ml-playground <regression|kmeans|descent|network|transformer> [config.json]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let demo = args.next().context(USAGE)?.parse::<Demo>().context(USAGE)?;
    let config = PlaygroundConfig::load(args.next().as_deref())?;

    let stop = StopFlag::new();
    let mut run = task::spawn_blocking({
        let stop = stop.clone();
        move || demos::run(demo, &config, stop)
    });

    let report = tokio::select! {
        ret = &mut run => ret.context("demo task panicked")??,
        _ = signal::ctrl_c() => {
            info!("received SIGINT, finishing the current step");
            stop.stop();
            run.await.context("demo task panicked")??
        }
    };

    if stop.is_stopped() {
        warn!("training was interrupted, the report is partial");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
