use tabnews_tui::app::Overrides;
use tabnews_tui::tabnews::Strategy;

const HELP: &str = "TabNews-TUI - Browse TabNews from the terminal.

  --version, -V           Show version and exit
  --help,    -h           Show this help message
  --strategy <name>       Feed ordering: relevant, new or old
  --user <username>       Only list contents published by <username>
  --page <n>              Start on feed page <n>";

enum Cli {
    Exit,
    Run(Overrides),
}

fn main() {
    let overrides = match parse_args(std::env::args().skip(1)) {
        Ok(Cli::Exit) => return,
        Ok(Cli::Run(overrides)) => overrides,
        Err(message) => {
            eprintln!("error: {message}\n\n{HELP}");
            std::process::exit(2);
        }
    };

    if let Err(err) = tabnews_tui::run(overrides) {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Cli, String> {
    let mut overrides = Overrides::default();
    let mut saw_flag = false;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("TabNews-TUI {}", tabnews_tui::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!("{HELP}");
                saw_flag = true;
            }
            "--strategy" => {
                let value = flag_value(&mut args, "--strategy")?;
                let strategy = Strategy::parse(&value)
                    .ok_or_else(|| format!("unknown strategy '{value}'"))?;
                overrides.strategy = Some(strategy);
            }
            "--user" => {
                let value = flag_value(&mut args, "--user")?;
                let name = value.trim().trim_start_matches('@');
                if name.is_empty() {
                    return Err("--user needs a username".into());
                }
                overrides.username = Some(name.to_string());
            }
            "--page" => {
                let value = flag_value(&mut args, "--page")?;
                match value.parse::<u32>() {
                    Ok(page) if page >= 1 => overrides.page = Some(page),
                    _ => return Err(format!("--page expects a number >= 1, got '{value}'")),
                }
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(if saw_flag {
        Cli::Exit
    } else {
        Cli::Run(overrides)
    })
}

fn flag_value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("{flag} needs a value"))
}
