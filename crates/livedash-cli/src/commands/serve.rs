pub fn run(host: &str, port: u16) {
    super::init_logging();
    let base = format!("http://{host}:{port}");

    println!("livedash demo source v{}", livedash_core::VERSION);
    println!("   {base}");
    println!();
    println!("   Endpoints:");
    println!("     GET  /               API index (try: curl {base})");
    println!("     POST /temperature/   Current metrics");
    println!("     POST /modifyData/    Change a modifiable metric");
    println!("     GET  /snapshot.png   Camera still");
    println!();
    println!("   Try:");
    println!("     livedash monitor --url {base}");
    println!("     livedash mutate --url {base} --metric setpoint --value 2");
    println!();

    let rt = super::runtime();
    if let Err(e) = rt.block_on(livedash_server::run_server(host, port)) {
        eprintln!("Error: server stopped: {e}");
        std::process::exit(1);
    }
}
