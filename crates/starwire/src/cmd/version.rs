use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("starwire {}", env!("CARGO_PKG_VERSION"));
    if !args.extended {
        return Ok(SUCCESS);
    }

    println!(
        "target: {}",
        option_env!("STARWIRE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("policies: hop-insert, strict-pair");
    println!(
        "transports: loopback{}",
        if cfg!(unix) { ", unix" } else { "" }
    );
    println!("features: node={}, cli=true", cfg!(feature = "node"));

    Ok(SUCCESS)
}
