use api_gateway_canary::scenario;
use http_load_runner::prelude::*;

fn main() -> LoadDriverResult<()> {
    let cli = init();

    run(scenario(env!("CARGO_PKG_NAME"), cli))?;

    Ok(())
}
