/*!
Contains the application state and the logic to run the requested actions
*/

use std::{
    fs,
    io::{stdout, Write},
};

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use binplist::{
    binary::{models::MAGIC, reader::PlistReader, writer::PlistWriter},
    read_plist_from_bytes, write_plist, PlistError, Value,
};

use crate::{
    app::{
        error::RuntimeError,
        options::{DumpType, Options},
    },
    exporters::{exporter::Exporter, json::JSON, txt::TXT},
};

/// Log level used when `RUST_LOG` is not set and `--verbose` is not passed
const DEFAULT_LOG_LEVEL: &str = "warn";
/// Log level used when `RUST_LOG` is not set and `--verbose` is passed
const VERBOSE_LOG_LEVEL: &str = "debug";

/// Stores the application state and handles application lifecycle
pub struct Config {
    /// App configuration options
    pub options: Options,
    /// The raw bytes of the input file
    pub bytes: Vec<u8>,
    /// The decoded input file
    pub value: Value,
}

impl Config {
    /// Create a new instance of the application by reading and decoding the input file
    pub fn new(options: Options) -> Result<Config, RuntimeError> {
        let bytes = fs::read(&options.input_path)
            .map_err(|err| RuntimeError::ReadError(err, options.input_path.clone()))?;
        debug!(
            path = %options.input_path.display(),
            bytes = bytes.len(),
            "Read input file"
        );

        let value = read_plist_from_bytes(&bytes)
            .map_err(|err| RuntimeError::PlistError(err, options.input_path.clone()))?;

        Ok(Config {
            options,
            bytes,
            value,
        })
    }

    /// Determine if the input file is a binary property list
    pub fn is_binary(&self) -> bool {
        self.bytes.starts_with(MAGIC)
    }

    /// Describe the layout of the input file and of its re-encoding
    pub fn diagnostic(&self) -> Result<String, RuntimeError> {
        let mut out_s = String::new();
        let path = &self.options.input_path;
        let plist_error = |err: PlistError| RuntimeError::PlistError(err, path.clone());

        out_s.push_str(&format!("Input: {}\n", path.display()));
        out_s.push_str(&format!("File size: {} bytes\n", self.bytes.len()));

        if self.is_binary() {
            let mut reader = PlistReader::new(&self.bytes);
            reader.parse().map_err(plist_error)?;
            if let Some(trailer) = reader.trailer() {
                out_s.push_str("Encoding: binary\n");
                out_s.push_str(&format!("Offset size: {}\n", trailer.offset_size));
                out_s.push_str(&format!(
                    "Object reference size: {}\n",
                    trailer.object_ref_size
                ));
                out_s.push_str(&format!("Objects: {}\n", trailer.offset_count));
                out_s.push_str(&format!(
                    "Root object: {}\n",
                    trailer.top_level_object_number
                ));
                out_s.push_str(&format!(
                    "Offset table position: {}\n",
                    trailer.offset_table_offset
                ));
            }
        } else {
            out_s.push_str("Encoding: xml\n");
        }

        let writer = PlistWriter::new(&self.value).map_err(|err| plist_error(err.into()))?;
        let counts = writer.byte_counts();
        out_s.push_str(&format!(
            "Unique objects when written as binary: {}\n",
            writer.unique_objects()
        ));
        for (kind, count) in [
            ("null", counts.null_bytes),
            ("boolean", counts.bool_bytes),
            ("integer", counts.int_bytes),
            ("real", counts.real_bytes),
            ("date", counts.date_bytes),
            ("data", counts.data_bytes),
            ("string", counts.string_bytes),
            ("uid", counts.uid_bytes),
            ("array", counts.array_bytes),
            ("set", counts.set_bytes),
            ("dictionary", counts.dict_bytes),
        ] {
            if count > 0 {
                out_s.push_str(&format!("    {kind}: {count} bytes\n"));
            }
        }
        out_s.push_str(&format!("    total: {} bytes\n", counts.total()));

        Ok(out_s)
    }

    /// Handles the application flow
    pub fn start(&self) -> Result<(), RuntimeError> {
        if self.options.info {
            self.write_to_stdout(&self.diagnostic()?)?;
        }

        if let Some(dump_type) = &self.options.dump_type {
            let rendered = match dump_type {
                DumpType::Text => TXT::new(self).render(),
                DumpType::Json => JSON::new(self).render(),
            };
            self.write_to_stdout(&rendered)?;
        }

        if let Some(output_path) = &self.options.output_path {
            write_plist(&self.value, output_path, self.options.output_format)
                .map_err(|err| RuntimeError::PlistError(err, output_path.clone()))?;
            info!(
                path = %output_path.display(),
                format = ?self.options.output_format,
                "Wrote property list"
            );
        }

        Ok(())
    }

    fn write_to_stdout(&self, text: &str) -> Result<(), RuntimeError> {
        let mut handle = stdout().lock();
        handle
            .write_all(text.as_bytes())
            .and_then(|_| handle.flush())
            .map_err(RuntimeError::DiskError)
    }
}

/// Install the global log subscriber, writing to stderr
///
/// `RUST_LOG` takes precedence over the level chosen by `verbose`.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        VERBOSE_LOG_LEVEL
    } else {
        DEFAULT_LOG_LEVEL
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A subscriber may already be installed when running under a test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
