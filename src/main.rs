//! proftrack CLI - Track outreach to professors.

use clap::Parser;
use proftrack::cli::{
    ActivityCommands, Cli, Commands, ConfigCommands, ProfessorCommands, SystemCommands,
};
use proftrack::commands::{self, AddArgs, Output, UpdateArgs};
use proftrack::config::{ConfigOverrides, OutputFormat, ResolvedSettings};
use std::process;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter (e.g. `PT_LOG=debug`).
const LOG_ENV: &str = "PT_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let mut overrides = ConfigOverrides::new();
    if let Some(dir) = cli.data_dir {
        overrides = overrides.with_data_dir(dir);
    }
    if let Some(backend) = cli.backend {
        overrides = overrides.with_backend(backend);
    }
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }

    let settings = match ResolvedSettings::load(&overrides) {
        Ok(settings) => settings,
        Err(e) => {
            print_error(&e, cli.human_readable);
            process::exit(1);
        }
    };

    // config.kdl may ask for human output even without -H
    let human = settings.config.output_format() == OutputFormat::Human;
    if let Err(e) = run_command(cli.command, &settings, human) {
        print_error(&e, human);
        process::exit(1);
    }
}

fn print_error(e: &proftrack::Error, human: bool) {
    if human {
        eprintln!("Error: {}", e);
    } else {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
    }
}

fn run_command(
    command: Commands,
    settings: &ResolvedSettings,
    human: bool,
) -> Result<(), proftrack::Error> {
    match command {
        Commands::System { command } => match command {
            SystemCommands::Init { secret, api_key } => {
                let result = commands::system_init(settings, secret, api_key)?;
                output(&result, human);
            }
        },

        Commands::Login { secret } => {
            let result = commands::login(settings, &secret)?;
            output(&result, human);
        }

        Commands::Logout => {
            let result = commands::logout(settings)?;
            output(&result, human);
        }

        Commands::Admin => {
            let result = commands::admin_toggle(settings)?;
            output(&result, human);
        }

        Commands::Whoami => {
            let result = commands::whoami(settings)?;
            output(&result, human);
        }

        Commands::Professor { command } => match command {
            ProfessorCommands::Add {
                name,
                institution,
                role,
                status,
                liaison,
                engagement,
                core_ip,
                notes,
                next_action,
            } => {
                let args = AddArgs {
                    role,
                    status,
                    liaison,
                    engagement,
                    core_ip,
                    notes,
                    next_action,
                };
                let result = commands::professor_add(settings, &name, &institution, args)?;
                output(&result, human);
            }
            ProfessorCommands::List {
                search,
                status,
                liaison,
                stale,
            } => {
                let filter = commands::list_filter(search, status, liaison, stale);
                let result = commands::professor_list(settings, filter)?;
                output(&result, human);
            }
            ProfessorCommands::Show { id } => {
                let result = commands::professor_show(settings, &id)?;
                output(&result, human);
            }
            ProfessorCommands::Update {
                id,
                name,
                institution,
                role,
                status,
                liaison,
                engagement,
                notes,
                next_action,
                contract_signed,
                add_core_ip,
                remove_core_ip,
                add_program,
                remove_program,
                add_client,
                remove_client,
                links,
            } => {
                let args = UpdateArgs {
                    name,
                    institution,
                    role,
                    status,
                    liaison,
                    engagement,
                    notes,
                    next_action,
                    contract_signed,
                    add_core_ip,
                    remove_core_ip,
                    add_program,
                    remove_program,
                    add_client,
                    remove_client,
                    links,
                };
                let result = commands::professor_update(settings, &id, args)?;
                output(&result, human);
            }
        },

        Commands::Activity { command } => match command {
            ActivityCommands::Add {
                professor_id,
                entry,
                date,
                created_by,
            } => {
                let result = commands::activity_add(
                    settings,
                    &professor_id,
                    &entry,
                    date,
                    created_by.as_deref(),
                )?;
                output(&result, human);
            }
            ActivityCommands::List { professor_id } => {
                let result = commands::activity_list(settings, &professor_id)?;
                output(&result, human);
            }
        },

        Commands::Summary => {
            let result = commands::summary(settings)?;
            output(&result, human);
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let result = commands::config_show(settings);
                output(&result, human);
            }
            ConfigCommands::Set { key, value } => {
                let result = commands::config_set(settings, &key, &value)?;
                output(&result, human);
            }
        },
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
