use derivcalc::*;
use std::io::BufRead;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let mut ctx = Session::init();
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match ctx.eval_program(&line) {
            Ok(Some(result)) => println!("{}", result),
            Ok(None) => (),
            Err(e) => println!("Error: {:?}", e)
        }
    }
    Ok(())
}
