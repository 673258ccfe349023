/*!
Parses and validates the command line options
*/

use std::path::PathBuf;

use clap::{crate_description, crate_version, Arg, ArgAction, ArgMatches, Command};

use binplist::Format;

use crate::app::error::RuntimeError;

/// Default format to write when `--output` is given
pub const DEFAULT_OUTPUT_FORMAT: &str = "binary";

// CLI Arg Names
pub const OPTION_INPUT: &str = "input";
pub const OPTION_OUTPUT: &str = "output";
pub const OPTION_FORMAT: &str = "format";
pub const OPTION_DUMP: &str = "dump";
pub const OPTION_INFO: &str = "info";
pub const OPTION_VERBOSE: &str = "verbose";

// Other CLI Text
pub const SUPPORTED_OUTPUT_FORMATS: [&str; 2] = ["binary", "xml"];
pub const SUPPORTED_DUMP_TYPES: [&str; 2] = ["text", "json"];
pub const ABOUT: &str = concat!(
    "The `binplist` binary converts between binary and XML property lists,\n",
    "prints their contents as text or JSON, and reports how a binary\n",
    "property list is laid out on disk."
);

/// Kinds of human readable dumps the app can print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpType {
    /// Indented text
    Text,
    /// JSON, with data encoded as base64
    Json,
}

impl DumpType {
    /// Given user's input, return a variant if the input matches one
    pub fn from_cli(dump_type: &str) -> Option<Self> {
        match dump_type.to_lowercase().as_str() {
            "txt" | "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Options {
    /// Path to the property list to read
    pub input_path: PathBuf,
    /// Path to write the converted property list to
    pub output_path: Option<PathBuf>,
    /// Encoding used for `output_path`
    pub output_format: Format,
    /// Kind of dump to print to stdout, if any
    pub dump_type: Option<DumpType>,
    /// If true, print the layout of the input file
    pub info: bool,
    /// If true, emit debug logs on stderr
    pub verbose: bool,
}

impl Options {
    pub fn from_args(args: &ArgMatches) -> Result<Self, RuntimeError> {
        let input_path = args.get_one::<String>(OPTION_INPUT);
        let output_path = args.get_one::<String>(OPTION_OUTPUT);
        let output_format = args.get_one::<String>(OPTION_FORMAT);
        let dump_type = args.get_one::<String>(OPTION_DUMP);
        let info = args.get_flag(OPTION_INFO);
        let verbose = args.get_flag(OPTION_VERBOSE);

        // Ensure there is an input file
        let input_path = match input_path {
            Some(path) => PathBuf::from(path),
            None => {
                return Err(RuntimeError::InvalidOptions(format!(
                    "Option --{OPTION_INPUT} is required"
                )))
            }
        };

        // Ensure the output format is only set when writing a file
        if output_format.is_some() && output_path.is_none() {
            return Err(RuntimeError::InvalidOptions(format!(
                "Option --{OPTION_FORMAT} is enabled, which requires --{OPTION_OUTPUT}"
            )));
        }

        // Ensure there is something to do
        if output_path.is_none() && dump_type.is_none() && !info {
            return Err(RuntimeError::InvalidOptions(format!(
                "Nothing to do! Pass --{OPTION_OUTPUT}, --{OPTION_DUMP}, or --{OPTION_INFO}"
            )));
        }

        let output_format = match output_format {
            Some(format) => Format::from_cli(format).ok_or_else(|| {
                RuntimeError::InvalidOptions(format!(
                    "{format} is not a valid output format! Must be one of <{}>",
                    SUPPORTED_OUTPUT_FORMATS.join(", ")
                ))
            })?,
            None => Format::default(),
        };

        let dump_type = match dump_type {
            Some(dump_type) => Some(DumpType::from_cli(dump_type).ok_or_else(|| {
                RuntimeError::InvalidOptions(format!(
                    "{dump_type} is not a valid dump type! Must be one of <{}>",
                    SUPPORTED_DUMP_TYPES.join(", ")
                ))
            })?),
            None => None,
        };

        Ok(Options {
            input_path,
            output_path: output_path.map(PathBuf::from),
            output_format,
            dump_type,
            info,
            verbose,
        })
    }
}

/// Build the command line arguments
pub fn get_command() -> Command {
    Command::new("binplist")
        .version(crate_version!())
        .about(ABOUT)
        .long_about(crate_description!())
        .arg_required_else_help(true)
        .arg(
            Arg::new(OPTION_INPUT)
                .short('i')
                .long(OPTION_INPUT)
                .help("Path to the property list to read, binary or XML\n")
                .value_name("path/to/file.plist")
                .display_order(0),
        )
        .arg(
            Arg::new(OPTION_OUTPUT)
                .short('o')
                .long(OPTION_OUTPUT)
                .help("Write the property list to this path\n")
                .value_name("path/to/output.plist")
                .display_order(1),
        )
        .arg(
            Arg::new(OPTION_FORMAT)
                .short('f')
                .long(OPTION_FORMAT)
                .help(format!(
                    "Encoding to use with --{OPTION_OUTPUT}\nIf omitted, the default is `{DEFAULT_OUTPUT_FORMAT}`\n"
                ))
                .value_parser(SUPPORTED_OUTPUT_FORMATS)
                .display_order(2),
        )
        .arg(
            Arg::new(OPTION_DUMP)
                .short('d')
                .long(OPTION_DUMP)
                .help("Print the contents of the property list to stdout\n")
                .value_parser(SUPPORTED_DUMP_TYPES)
                .display_order(3),
        )
        .arg(
            Arg::new(OPTION_INFO)
                .short('n')
                .long(OPTION_INFO)
                .help("Print the trailer and per-kind byte counts of the property list\n")
                .action(ArgAction::SetTrue)
                .display_order(4),
        )
        .arg(
            Arg::new(OPTION_VERBOSE)
                .short('v')
                .long(OPTION_VERBOSE)
                .help("Log what the parser and writer are doing to stderr\nThe RUST_LOG environment variable takes precedence\n")
                .action(ArgAction::SetTrue)
                .display_order(5),
        )
}

/// Parse arguments from the command line
pub fn from_command_line() -> ArgMatches {
    get_command().get_matches()
}

#[cfg(test)]
mod arg_tests {
    use std::path::PathBuf;

    use binplist::Format;

    use crate::app::options::{get_command, DumpType, Options};

    #[test]
    fn can_build_option_output() {
        let command = get_command();
        let args = command.get_matches_from([
            "binplist",
            "-i",
            "in.plist",
            "-o",
            "out.plist",
            "-f",
            "xml",
        ]);

        let actual = Options::from_args(&args).unwrap();

        let expected = Options {
            input_path: PathBuf::from("in.plist"),
            output_path: Some(PathBuf::from("out.plist")),
            output_format: Format::Xml,
            dump_type: None,
            info: false,
            verbose: false,
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn can_build_option_dump_and_info() {
        let command = get_command();
        let args = command.get_matches_from([
            "binplist", "-i", "in.plist", "-d", "json", "--info", "-v",
        ]);

        let actual = Options::from_args(&args).unwrap();

        assert_eq!(actual.dump_type, Some(DumpType::Json));
        assert_eq!(actual.output_path, None);
        assert_eq!(actual.output_format, Format::Binary);
        assert!(actual.info);
        assert!(actual.verbose);
    }

    #[test]
    fn cant_build_option_no_input() {
        let command = get_command();
        let args = command.get_matches_from(["binplist", "--info"]);

        assert!(Options::from_args(&args).is_err());
    }

    #[test]
    fn cant_build_option_nothing_to_do() {
        let command = get_command();
        let args = command.get_matches_from(["binplist", "-i", "in.plist"]);

        assert!(Options::from_args(&args).is_err());
    }

    #[test]
    fn cant_build_option_format_without_output() {
        let command = get_command();
        let args = command.get_matches_from(["binplist", "-i", "in.plist", "-f", "xml", "-n"]);

        assert!(Options::from_args(&args).is_err());
    }

    #[test]
    fn cant_parse_unknown_dump_type() {
        let command = get_command();
        let result =
            command.try_get_matches_from(["binplist", "-i", "in.plist", "-d", "html"]);

        assert!(result.is_err());
    }

    #[test]
    fn can_parse_dump_types() {
        assert_eq!(DumpType::from_cli("TXT"), Some(DumpType::Text));
        assert_eq!(DumpType::from_cli("json"), Some(DumpType::Json));
        assert_eq!(DumpType::from_cli("html"), None);
    }
}
