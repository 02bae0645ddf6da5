mod app;
mod args;
mod input;

use app::App;
use args::HapdirArgs;
use clap::Parser;
use hapdir_transport::SerialSink;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = HapdirArgs::parse();

    if args.list_ports {
        println!("Available devices:");
        for port in SerialSink::available_ports()? {
            println!("\t{port}");
        }
        return Ok(());
    }

    let app = App::new(args)?;
    app.run()?;

    Ok(())
}
