use std::path::PathBuf;

/// A user gesture, typed at the shell prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Select a scan file.
    Open(PathBuf),
    /// Start the analysis of the selected scan.
    Analyze,
    /// Drop the scan and any result.
    Reset,
    /// Start a fresh session, probing the backend again.
    Reload,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  open PATH   select a CT scan image (JPEG, PNG, DICOM; max 10MB advised)
  analyze     start the analysis of the selected scan
  reset       discard the scan and any result
  reload      start a new session and check the backend again
  status      show the current state
  help        show this help
  quit        exit";

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "open" | "select" => {
                if rest.is_empty() {
                    return Err("usage: open PATH".into());
                }
                Command::Open(PathBuf::from(unquote(rest)))
            }
            "analyze" | "start" => Command::Analyze,
            "reset" => Command::Reset,
            "reload" => Command::Reload,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{other}', try 'help'")),
        };
        Ok(Some(command))
    }
}

/// Strip one pair of matching quotes, so dragged-in paths work.
fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("  "), Ok(None));
        assert_eq!(Command::parse("analyze"), Ok(Some(Command::Analyze)));
        assert_eq!(Command::parse("RESET"), Ok(Some(Command::Reset)));
        assert_eq!(Command::parse("exit"), Ok(Some(Command::Quit)));
        assert_eq!(
            Command::parse("open /tmp/chest scan.png"),
            Ok(Some(Command::Open(PathBuf::from("/tmp/chest scan.png"))))
        );
        assert_eq!(
            Command::parse("open '/tmp/a b.dcm'"),
            Ok(Some(Command::Open(PathBuf::from("/tmp/a b.dcm"))))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Command::parse("open").is_err());
        assert!(Command::parse("frobnicate").unwrap_err().contains("frobnicate"));
    }
}
