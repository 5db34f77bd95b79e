fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if handle_cli_flags(&args) {
        return;
    }

    let command = match bookclub::Command::parse(&args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };

    if let Err(err) = bookclub::run(command) {
        eprintln!("error: {}", bookclub::app::describe_error(&err));
        std::process::exit(1);
    }
}

fn handle_cli_flags(args: &[String]) -> bool {
    let mut saw_flag = false;
    for arg in args {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("Bookclub {}", bookclub::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!("{}", bookclub::app::USAGE);
                saw_flag = true;
            }
            _ => {}
        }
    }
    saw_flag
}
