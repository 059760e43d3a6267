use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("traxlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: traxlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("TRAXLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("features: async={}, cli=true", cfg!(feature = "async"));
    println!(
        "serial: {} baud default, {} supported rates",
        traxlink_transport::DEFAULT_BAUD,
        traxlink_transport::SUPPORTED_BAUDS.len()
    );

    Ok(SUCCESS)
}
