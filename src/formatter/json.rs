use super::{IoctlItem, OutputFormatter};
use errexplain::Explanation;
use serde::Serialize;
use std::io::Write;

pub struct JsonFormatter {
    data: JsonData,
}

#[derive(Serialize, Default)]
struct JsonData {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    explanations: Vec<JsonExplanation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ioctls: Option<Vec<JsonIoctl>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<usize>,
}

#[derive(Serialize)]
struct JsonExplanation {
    call: String,
    errno: i32,
    errno_name: Option<String>,
    description: String,
    explanation: String,
    message: String,
}

#[derive(Serialize)]
struct JsonIoctl {
    name: String,
    number: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    data_type: String,
}

impl JsonFormatter {
    pub fn new() -> Self {
        JsonFormatter { data: JsonData::default() }
    }
}

impl OutputFormatter for JsonFormatter {
    fn begin_document(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn end_document(&mut self, w: &mut dyn Write) -> std::io::Result<()> {
        // A single explanation is printed bare rather than wrapped in a list.
        let json = match self.data.explanations.as_slice() {
            [only] if self.data.ioctls.is_none() => serde_json::to_string_pretty(only)?,
            _ => serde_json::to_string_pretty(&self.data)?,
        };
        writeln!(w, "{json}")?;
        Ok(())
    }

    fn explanation(
        &mut self,
        _w: &mut dyn Write,
        explanation: &Explanation,
    ) -> std::io::Result<()> {
        self.data.explanations.push(JsonExplanation {
            call: explanation.call.clone(),
            errno: explanation.errno,
            errno_name: explanation.errno_name.map(str::to_string),
            description: explanation.description.clone(),
            explanation: explanation.cause.clone(),
            message: explanation.message.clone(),
        });
        Ok(())
    }

    fn begin_ioctl_list(&mut self, _w: &mut dyn Write, _title: &str) -> std::io::Result<()> {
        self.data.ioctls = Some(Vec::new());
        Ok(())
    }

    fn ioctl_item(&mut self, _w: &mut dyn Write, item: &IoctlItem) -> std::io::Result<()> {
        if let Some(ioctls) = &mut self.data.ioctls {
            ioctls.push(JsonIoctl {
                name: item.name.to_string(),
                number: item.number,
                data_type: item.data_type.to_string(),
            });
        }
        Ok(())
    }

    fn end_ioctl_list(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn total_ioctls(&mut self, _w: &mut dyn Write, count: usize) -> std::io::Result<()> {
        self.data.total = Some(count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errexplain::Call;
    use std::path::Path;

    #[test]
    fn test_single_explanation_fields() {
        let call =
            Call::Open { pathname: Path::new("/nonexistent/x"), flags: libc::O_RDONLY, mode: 0 };
        let explanation = Explanation::new(libc::ENOENT, &call, 3000);
        let mut formatter = JsonFormatter::new();
        let mut out = Vec::new();
        formatter.begin_document(&mut out).unwrap();
        formatter.explanation(&mut out, &explanation).unwrap();
        formatter.end_document(&mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["errno"], 2);
        assert_eq!(value["errno_name"], "ENOENT");
        assert_eq!(value["call"], "open(pathname = \"/nonexistent/x\", flags = O_RDONLY)");
        assert_eq!(value["message"], explanation.message.as_str());
        assert_eq!(value["explanation"], explanation.cause.as_str());
    }

    #[test]
    fn test_ioctl_listing() {
        let mut formatter = JsonFormatter::new();
        let mut out = Vec::new();
        formatter.begin_ioctl_list(&mut out, "Requests").unwrap();
        let item = IoctlItem { name: "TCGETS", number: 0x5401, data_type: "struct termios *" };
        formatter.ioctl_item(&mut out, &item).unwrap();
        formatter.end_ioctl_list(&mut out).unwrap();
        formatter.total_ioctls(&mut out, 1).unwrap();
        formatter.end_document(&mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["ioctls"][0]["name"], "TCGETS");
        assert_eq!(value["ioctls"][0]["number"], 0x5401);
        assert_eq!(value["total"], 1);
    }
}
