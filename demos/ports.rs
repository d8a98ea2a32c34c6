//! List serial ports the panel could be attached to.

fn main() {
    env_logger::init();

    match serialport::available_ports() {
        Ok(ports) => {
            println!("Found {} serial port(s):", ports.len());
            for (i, port) in ports.iter().enumerate() {
                println!("  [{}] {}  {:?}", i, port.port_name, port.port_type);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
