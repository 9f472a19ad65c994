use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("iotbridge {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: iotbridge");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("IOTBRIDGE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("IOTBRIDGE_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "max_socket_path: {}",
        iotbridge_transport::MAX_PATH_LEN - 1
    );
    println!(
        "default_max_message_size: {}",
        iotbridge_message::DEFAULT_MAX_MESSAGE_SIZE
    );
    println!("default_backlog: {}", iotbridge_transport::DEFAULT_BACKLOG);

    Ok(SUCCESS)
}
