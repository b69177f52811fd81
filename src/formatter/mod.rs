use std::io::Write;

use errexplain::Explanation;

mod json;
mod plain;

pub use json::JsonFormatter;
pub use plain::PlainFormatter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Plain,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(OutputFormat::Plain),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// One row of the ioctl catalogue listing.
pub struct IoctlItem<'a> {
    pub name: &'a str,
    pub number: u64,
    pub data_type: &'a str,
}

pub trait OutputFormatter {
    fn begin_document(&mut self, w: &mut dyn Write) -> std::io::Result<()>;
    fn end_document(&mut self, w: &mut dyn Write) -> std::io::Result<()>;

    fn explanation(&mut self, w: &mut dyn Write, explanation: &Explanation) -> std::io::Result<()>;

    fn begin_ioctl_list(&mut self, w: &mut dyn Write, title: &str) -> std::io::Result<()>;
    fn ioctl_item(&mut self, w: &mut dyn Write, item: &IoctlItem) -> std::io::Result<()>;
    fn end_ioctl_list(&mut self, w: &mut dyn Write) -> std::io::Result<()>;

    fn total_ioctls(&mut self, w: &mut dyn Write, count: usize) -> std::io::Result<()>;
}

pub fn create_formatter(format: OutputFormat, width: usize) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Plain => Box::new(PlainFormatter::new(width)),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!("plain".parse::<OutputFormat>(), Ok(OutputFormat::Plain));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("rst".parse::<OutputFormat>().is_err());
    }
}
