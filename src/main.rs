//! errexplain - explain why a system call failed
//!
//! Given the call, its arguments and the error it returned, prints one
//! sentence naming the most likely cause:
//!
//! ```text
//! $ errexplain -e ENOENT open /nonexistent O_RDONLY
//! open(pathname = "/nonexistent", flags = O_RDONLY) failed, the named file does not exist (ENOENT 2, No such file or directory)
//! ```

use anyhow::{Result, bail};
use clap::Parser;
use std::io;

mod adapters;
mod formatter;
mod options;

use errexplain::explain::DEFAULT_BUFFER_SIZE;
use errexplain::ioctl;
use formatter::{IoctlItem, OutputFormat, OutputFormatter, create_formatter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Error the call returned, as a symbol (ENOENT) or a number
    #[arg(long, short = 'e', value_name = "ERRNO", required_unless_present = "list_ioctls")]
    errno: Option<String>,

    /// Output format
    #[arg(long, short = 'f')]
    format: Option<String>,

    /// Wrap the message at this many columns (0 disables wrapping)
    #[arg(long, short = 'w')]
    width: Option<usize>,

    /// Capacity of the explanation buffer
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// List the ioctl requests this tool knows about
    #[arg(long)]
    list_ioctls: bool,

    /// Name of the failed call
    #[arg(required_unless_present = "list_ioctls")]
    call: Option<String>,

    /// Arguments of the failed call, in prototype order
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let env = options::from_env()?;

    let output_format: OutputFormat = match &args.format {
        Some(format) => format.parse().map_err(|e: String| anyhow::anyhow!(e))?,
        None => env.format.unwrap_or(OutputFormat::Plain),
    };
    let width = args.width.or(env.width).unwrap_or(0);
    let mut formatter = create_formatter(output_format, width);

    if args.list_ioctls {
        return display_ioctls(formatter.as_mut());
    }

    let (Some(errno), Some(call)) = (&args.errno, &args.call) else {
        let known: Vec<_> = adapters::call_names().collect();
        bail!("Please specify both --errno and one of the calls: {}", known.join(", "));
    };
    let errnum = adapters::parse_errno(errno)?;
    let explanation = adapters::explain(call, &args.args, errnum, args.buffer_size)?;

    let mut stdout = io::stdout();
    formatter.begin_document(&mut stdout)?;
    formatter.explanation(&mut stdout, &explanation)?;
    formatter.end_document(&mut stdout)?;

    Ok(())
}

fn display_ioctls(formatter: &mut dyn OutputFormatter) -> Result<()> {
    let mut stdout = io::stdout();
    let named: Vec<_> = ioctl::catalogue()
        .iter()
        .filter_map(|d| d.name.map(|name| (name, *d)))
        .collect();

    formatter.begin_document(&mut stdout)?;
    formatter.begin_ioctl_list(&mut stdout, "IOCTL requests")?;
    for (name, descriptor) in &named {
        let item =
            IoctlItem { name: *name, number: descriptor.number, data_type: descriptor.data_type };
        formatter.ioctl_item(&mut stdout, &item)?;
    }
    formatter.end_ioctl_list(&mut stdout)?;
    formatter.total_ioctls(&mut stdout, named.len())?;
    formatter.end_document(&mut stdout)?;
    Ok(())
}
