//! Parser for 2BP instance files.
//!
//! A file holds a sequence of instances separated by blank lines. Each
//! instance starts with a line containing `PROBLEM`, followed by three
//! heading lines (item count, instance numbering, bin dimensions) and one
//! line per item. Only the leading integer tokens of each line are read;
//! trailing labels such as `N. OF ITEMS` are ignored.

use rbp_core::{Instance, Item};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when parsing instance files.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid instance format at line {line}: {message}")]
    InvalidFormat { line: usize, message: String },
}

/// Position within an instance block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    ItemCount,
    Numbering,
    BinDimensions,
    Items,
}

/// Instance being read.
struct Pending {
    section: Section,
    expected_items: usize,
    instance: Instance,
    items: Vec<Item>,
}

impl Pending {
    fn new() -> Self {
        Self {
            section: Section::ItemCount,
            expected_items: 0,
            instance: Instance::default(),
            items: Vec::new(),
        }
    }

    fn finish(mut self, index: usize) -> Instance {
        if self.items.len() != self.expected_items {
            log::warn!(
                "instance {} declares {} items but lists {}",
                index,
                self.expected_items,
                self.items.len()
            );
        }
        self.instance.load_items(self.items);
        self.instance
    }
}

/// Parser for 2BP benchmark files.
#[derive(Debug, Default)]
pub struct InstanceParser;

impl InstanceParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses all instances of a file.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Vec<Instance>, ParseError> {
        let content = fs::read_to_string(path)?;
        self.parse_str(&content)
    }

    /// Parses all instances of a string.
    pub fn parse_str(&self, content: &str) -> Result<Vec<Instance>, ParseError> {
        let mut instances = Vec::new();
        let mut pending: Option<Pending> = None;

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();

            if tokens.is_empty() {
                if let Some(done) = pending.take() {
                    Self::close(done, line_no, &mut instances)?;
                }
                continue;
            }

            if line.contains("PROBLEM") {
                if let Some(done) = pending.take() {
                    Self::close(done, line_no, &mut instances)?;
                }
                pending = Some(Pending::new());
                continue;
            }

            let current = pending.as_mut().ok_or_else(|| ParseError::InvalidFormat {
                line: line_no,
                message: "data before the first PROBLEM header".to_string(),
            })?;

            match current.section {
                Section::ItemCount => {
                    current.expected_items = parse_int(&tokens, 0, line_no)? as usize;
                    current.section = Section::Numbering;
                }
                Section::Numbering => {
                    current.section = Section::BinDimensions;
                }
                Section::BinDimensions => {
                    let width = parse_int(&tokens, 0, line_no)?;
                    let height = parse_int(&tokens, 1, line_no)?;
                    if width <= 0 || height <= 0 {
                        return Err(ParseError::InvalidFormat {
                            line: line_no,
                            message: format!(
                                "bin dimensions must be positive, got {} {}",
                                width, height
                            ),
                        });
                    }
                    current.instance.set_bin_dimensions(width, height);
                    current.section = Section::Items;
                }
                Section::Items => {
                    let width = parse_int(&tokens, 0, line_no)?;
                    let height = parse_int(&tokens, 1, line_no)?;
                    current.items.push(Item::new(width, height));
                }
            }
        }

        if let Some(done) = pending.take() {
            let last_line = content.lines().count();
            Self::close(done, last_line, &mut instances)?;
        }

        log::debug!("parsed {} instances", instances.len());
        Ok(instances)
    }

    fn close(
        pending: Pending,
        line: usize,
        instances: &mut Vec<Instance>,
    ) -> Result<(), ParseError> {
        if pending.section != Section::Items {
            return Err(ParseError::InvalidFormat {
                line,
                message: "instance ends before its bin dimensions".to_string(),
            });
        }
        instances.push(pending.finish(instances.len()));
        Ok(())
    }
}

fn parse_int(tokens: &[&str], index: usize, line: usize) -> Result<i64, ParseError> {
    let token = tokens.get(index).ok_or_else(|| ParseError::InvalidFormat {
        line,
        message: format!("expected at least {} values", index + 1),
    })?;
    token.parse().map_err(|_| ParseError::InvalidFormat {
        line,
        message: format!("'{}' is not an integer", token),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_INSTANCES: &str = "\
 1    PROBLEM CLASS
 3    N. OF ITEMS
 1  1 RELATIVE AND ABSOLUTE N. OF INSTANCE
10 10 HBIN,WBIN
 6  4 H(I),W(I),I=1,...,N
 4  6
 5  5

 1    PROBLEM CLASS
 2    N. OF ITEMS
 2  2 RELATIVE AND ABSOLUTE N. OF INSTANCE
 4  5 HBIN,WBIN
 3  3
 3  3
";

    #[test]
    fn test_parse_instances() {
        let instances = InstanceParser::new().parse_str(TWO_INSTANCES).unwrap();
        assert_eq!(instances.len(), 2);

        let first = &instances[0];
        assert_eq!((first.bin_width(), first.bin_height()), (10, 10));
        assert_eq!(first.len(), 3);
        assert_eq!(first.items()[0].width(), 6);
        assert_eq!(first.items()[0].height(), 4);
        assert_eq!(first.items()[2].id(), Some(2));

        let second = &instances[1];
        assert_eq!((second.bin_width(), second.bin_height()), (4, 5));
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_repeated_blank_lines() {
        let content = TWO_INSTANCES.replace("\n\n", "\n\n\n\n");
        let instances = InstanceParser::new().parse_str(&content).unwrap();
        assert_eq!(instances.len(), 2);
    }

    #[test]
    fn test_invalid_item_line() {
        let content = "PROBLEM\n1\n1 1\n10 10\n3 x\n";
        match InstanceParser::new().parse_str(content) {
            Err(ParseError::InvalidFormat { line, .. }) => assert_eq!(line, 5),
            other => panic!("expected InvalidFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_bin_rejected() {
        for bin in ["0 10", "10 0", "-3 10"] {
            let content = format!("PROBLEM\n1\n1 1\n{}\n3 3\n", bin);
            match InstanceParser::new().parse_str(&content) {
                Err(ParseError::InvalidFormat { line, .. }) => assert_eq!(line, 4),
                other => panic!("expected InvalidFormat for '{}', got {:?}", bin, other),
            }
        }
    }

    #[test]
    fn test_data_before_header() {
        let result = InstanceParser::new().parse_str("3 3\n");
        assert!(matches!(
            result,
            Err(ParseError::InvalidFormat { line: 1, .. })
        ));
    }

    #[test]
    fn test_truncated_header() {
        let result = InstanceParser::new().parse_str("PROBLEM\n2\n\n");
        assert!(matches!(result, Err(ParseError::InvalidFormat { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = InstanceParser::new().parse_file("/nonexistent/Class_01.2bp");
        assert!(matches!(result, Err(ParseError::IoError(_))));
    }
}
