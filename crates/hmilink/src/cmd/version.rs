use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("hmilink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: hmilink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("HMILINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("HMILINK_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "defaults: buffer_capacity={}, read_chunk={}, slots={}",
        hmilink_frame::DEFAULT_BUFFER_CAPACITY,
        hmilink_frame::DEFAULT_READ_CHUNK_SIZE,
        hmilink_dispatch::DEFAULT_SLOT_COUNT
    );

    Ok(SUCCESS)
}
