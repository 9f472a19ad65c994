// Records what `iotbridge version --extended` reports about the build.
fn main() {
    for (source, exported) in [
        ("TARGET", "IOTBRIDGE_BUILD_TARGET"),
        ("PROFILE", "IOTBRIDGE_BUILD_PROFILE"),
    ] {
        if let Ok(value) = std::env::var(source) {
            println!("cargo:rustc-env={exported}={value}");
        }
        println!("cargo:rerun-if-env-changed={source}");
    }
}
