use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand};
use tracing::instrument;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rdspump",
    version,
    about = "Upload, download and delete files in an Oracle database directory object",
    long_about = "`rdspump` moves files between the local filesystem and an Oracle directory object
(e.g. DATA_PUMP_DIR on Amazon RDS) using UTL_FILE and BFILE calls over a regular connection.

Connection settings are read from `./rdspump.cfg` and `~/.rdspump.cfg`: a [DEFAULT] section plus
named profiles. Recognized keys: user, password, address, port, service, sid, dsn, directory,
profile. Command-line options override the selected profile, which overrides [DEFAULT].

EXAMPLES:
    # Upload a dump file into the configured directory
    rdspump -P prod put export.dmp

    # Download it again from an explicit directory object, gzipped
    rdspump -P prod get DATA_PUMP_DIR export.dmp -z

    # Remove it
    rdspump -P prod del export.dmp

    # Show available profiles
    rdspump -l"
)]
struct Args {
    // Configuration
    /// List profile names, or the settings of PROFILE
    #[arg(
        short = 'l',
        long = "list-profiles",
        value_name = "PROFILE",
        num_args = 0..=1,
        default_missing_value = "*",
        help_heading = "Configuration"
    )]
    list_profiles: Option<String>,

    /// Profile (section) from the configuration file
    #[arg(short = 'P', long, value_name = "NAME", help_heading = "Configuration")]
    profile: Option<String>,

    /// Read this configuration file instead of ./rdspump.cfg and ~/.rdspump.cfg
    #[arg(short = 'c', long, value_name = "PATH", help_heading = "Configuration")]
    config: Option<std::path::PathBuf>,

    // Connection
    /// Database user
    #[arg(long, value_name = "USER", help_heading = "Connection")]
    user: Option<String>,

    /// Database password
    #[arg(long, value_name = "PASSWORD", help_heading = "Connection")]
    password: Option<String>,

    /// Listener host name or IP address
    #[arg(long, value_name = "HOST", help_heading = "Connection")]
    address: Option<String>,

    /// Listener port (default: 1521)
    #[arg(long, value_name = "PORT", help_heading = "Connection")]
    port: Option<u16>,

    /// Service name
    #[arg(long, value_name = "NAME", help_heading = "Connection")]
    service: Option<String>,

    /// Instance SID
    #[arg(long, value_name = "SID", help_heading = "Connection")]
    sid: Option<String>,

    /// Full connect descriptor or TNS alias, used verbatim instead of address/port/service/sid
    #[arg(long, value_name = "DSN", help_heading = "Connection")]
    dsn: Option<String>,

    // Transfer options
    /// Size of each chunk sent to or read from the database, at most 32767 bytes
    #[arg(
        long,
        default_value = "32528",
        value_name = "SIZE",
        help_heading = "Transfer options"
    )]
    chunk_size: bytesize::ByteSize,

    // Progress & output
    /// Set the type of progress display
    ///
    /// Options are: `ProgressBar` (animated progress bar), `TextUpdates` (appropriate for logging), Auto (default, will
    /// choose between `ProgressBar` or `TextUpdates` depending on the type of terminal attached to stderr)
    #[arg(long, value_name = "TYPE", help_heading = "Progress & output")]
    progress_type: Option<common::ProgressType>,

    /// Sets the delay between progress updates
    ///
    /// - For the interactive (--progress-type=ProgressBar), the default is 200ms.
    /// - For the non-interactive (--progress-type=TextUpdates), the default is 30s.
    ///
    /// This option accepts a human readable duration, e.g. "200ms", "10s", "5min" etc.
    #[arg(long, value_name = "DELAY", help_heading = "Progress & output")]
    progress_delay: Option<String>,

    /// Verbose level: -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Print summary at the end
    #[arg(long, help_heading = "Progress & output")]
    summary: bool,

    /// Quiet mode, don't report errors or progress
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Args, Debug, Clone)]
struct Target {
    /// [DIRECTORY] FILE - directory object (defaults to the configured one) and file name
    #[arg(value_name = "FILE", num_args = 1..=2, required = true)]
    names: Vec<String>,
}

impl Target {
    fn directory(&self) -> Option<&str> {
        match self.names.as_slice() {
            [directory, _] => Some(directory.as_str()),
            _ => None,
        }
    }

    fn file(&self) -> &str {
        self.names.last().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Download a file from the database
    Get {
        #[command(flatten)]
        target: Target,

        /// Gzip the resulting file inline (adds a .gz suffix unless --output is given)
        #[arg(short = 'z')]
        gzip: bool,

        /// Local file to write, defaults to the remote file name
        #[arg(short = 'o', long, value_name = "PATH")]
        output: Option<std::path::PathBuf>,
    },
    /// Upload a local file into the database, replacing an existing one
    Put {
        #[command(flatten)]
        target: Target,
    },
    /// Delete a file from the database
    Del {
        #[command(flatten)]
        target: Target,
    },
}

impl Command {
    fn target(&self) -> &Target {
        match self {
            Command::Get { target, .. } | Command::Put { target } | Command::Del { target } => {
                target
            }
        }
    }

    fn mode(&self) -> common::Mode {
        match self {
            Command::Get { .. } => common::Mode::Get,
            Command::Put { .. } => common::Mode::Put,
            Command::Del { .. } => common::Mode::Del,
        }
    }

    /// Name of the file inside the directory object
    fn remote_name(&self) -> Result<String> {
        let file = self.target().file();
        match self {
            Command::Put { .. } => std::path::Path::new(file)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .with_context(|| format!("{file:?} does not name a file")),
            _ => Ok(file.to_string()),
        }
    }
}

fn overrides(args: &Args, command: &Command) -> Result<common::Overrides> {
    Ok(common::Overrides {
        profile: args.profile.clone(),
        directory: command.target().directory().map(str::to_string),
        file: Some(command.remote_name()?),
        mode: command.mode(),
        connection: common::ConnectionParams {
            user: args.user.clone(),
            password: args.password.clone(),
            port: args.port,
            sid: args.sid.clone(),
            service: args.service.clone(),
            address: args.address.clone(),
            dsn: args.dsn.clone(),
        },
    })
}

fn list_profiles(args: &Args, selector: &str) -> Result<()> {
    let config = common::ConfigFile::load(args.config.as_deref())?;
    config.list(Some(selector), &mut std::io::stdout().lock())?;
    Ok(())
}

#[instrument(skip(args))]
fn run_command(args: &Args, command: &Command) -> Result<common::Summary> {
    let config = common::ConfigFile::load(args.config.as_deref())?;
    let settings = common::resolve(&config, &overrides(args, command)?)?;
    let remote = settings.remote()?;
    let transfer = common::transfer::Settings {
        chunk_size: usize::try_from(args.chunk_size.as_u64())
            .map_err(|_| anyhow!("chunk size {} is too large", args.chunk_size))?,
    };
    transfer.validate()?;
    let progress_settings = if args.quiet {
        None
    } else {
        Some(common::ProgressSettings {
            progress_type: args.progress_type.unwrap_or_default(),
            progress_delay: args.progress_delay.clone(),
        })
    };
    let mut progress = common::progress::reporter(progress_settings.as_ref())?;
    tracing::info!("{} {}", settings.run.mode, remote);
    let mut session = common::oracle::OracleSession::connect(&settings.connection)?;
    let summary = match command {
        Command::Get { gzip, output, .. } => {
            let local = match output {
                Some(path) => path.clone(),
                None if *gzip => std::path::PathBuf::from(format!("{}.gz", remote.file())),
                None => std::path::PathBuf::from(remote.file()),
            };
            common::transfer::get(
                &mut session,
                &remote,
                &local,
                &transfer,
                &common::transfer::GetOptions { gzip: *gzip },
                progress.as_mut(),
            )?
        }
        Command::Put { target } => common::transfer::put(
            &mut session,
            std::path::Path::new(target.file()),
            &remote,
            &transfer,
            progress.as_mut(),
        )?,
        Command::Del { .. } => {
            common::transfer::delete(&mut session, &remote)?;
            common::Summary::default()
        }
    };
    Ok(summary)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: args.summary,
    };
    if let Some(selector) = args.list_profiles.as_deref() {
        if common::run(output, || list_profiles(&args, selector)).is_none() {
            std::process::exit(1);
        }
        return Ok(());
    }
    let Some(command) = args.command.as_ref() else {
        eprintln!("At least one subcommand expected.");
        eprintln!("{}", Args::command().render_usage());
        std::process::exit(2);
    };
    let res = common::run(output, || run_command(&args, command));
    match res {
        Some(summary) if output.print_summary => println!("{summary}"),
        Some(_) => {}
        None => std::process::exit(1),
    }
    Ok(())
}
