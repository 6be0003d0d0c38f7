/// One line of host input, parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Help,
    ListExamples,
    /// Load an example by name or 1-based position
    Load(String),
    Run,
    Show,
    Output,
    NewDocument,
    DeleteLine(usize),
    Status,
    Settings,
    Quit,

    /// Not a command; typed into the document
    Type(String),

    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  :examples, :ls       list example programs
  :load <name|number>  replace the document with an example
  :run, :r             run the document
  :show                print the document with line numbers
  :output              print the last output again
  :new                 start from an empty document
  :d <line>            delete a line of the document
  :status              show session and interpreter state
  :settings            print the active settings
  :quit, :q            exit
Any other line is appended to the document.";

pub fn parse_line(line: &str) -> Action {
    let Some(command) = line.trim_end().strip_prefix(':') else {
        return Action::Type(line.to_string());
    };

    let mut parts = command.trim().splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let arg = parts.next().map(str::trim).unwrap_or("");

    match (name, arg) {
        ("h" | "help", _) => Action::Help,
        ("ls" | "examples", _) => Action::ListExamples,
        ("load" | "e", arg) if !arg.is_empty() => Action::Load(arg.to_string()),
        ("r" | "run", _) => Action::Run,
        ("show", _) => Action::Show,
        ("output", _) => Action::Output,
        ("new", _) => Action::NewDocument,
        ("d" | "delete", arg) => match arg.parse::<usize>() {
            Ok(line) if line > 0 => Action::DeleteLine(line),
            _ => Action::Unknown(command.trim().to_string()),
        },
        ("status", _) => Action::Status,
        ("settings", _) => Action::Settings,
        ("q" | "quit", _) => Action::Quit,
        _ => Action::Unknown(command.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_typed() {
        assert_eq!(
            parse_line("print \"hi\";"),
            Action::Type("print \"hi\";".to_string())
        );
        assert_eq!(parse_line(""), Action::Type(String::new()));
        // leading whitespace keeps the line as code
        assert_eq!(parse_line("  :run"), Action::Type("  :run".to_string()));
    }

    #[test]
    fn aliases_map_to_same_action() {
        assert_eq!(parse_line(":r"), Action::Run);
        assert_eq!(parse_line(":run"), Action::Run);
        assert_eq!(parse_line(":q"), Action::Quit);
        assert_eq!(parse_line(":quit"), Action::Quit);
        assert_eq!(parse_line(":ls"), Action::ListExamples);
        assert_eq!(parse_line(":examples"), Action::ListExamples);
    }

    #[test]
    fn load_takes_argument() {
        assert_eq!(
            parse_line(":load linked_list.lox"),
            Action::Load("linked_list.lox".to_string())
        );
        assert_eq!(parse_line(":e 2  "), Action::Load("2".to_string()));
        assert_eq!(parse_line(":load"), Action::Unknown("load".to_string()));
    }

    #[test]
    fn delete_needs_positive_line() {
        assert_eq!(parse_line(":d 3"), Action::DeleteLine(3));
        assert_eq!(parse_line(":d 0"), Action::Unknown("d 0".to_string()));
        assert_eq!(parse_line(":d x"), Action::Unknown("d x".to_string()));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(parse_line(":wq"), Action::Unknown("wq".to_string()));
    }
}
