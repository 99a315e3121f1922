use super::{SourceLocation, SourceSpan};
use line_index::{LineIndex, TextSize, WideEncoding};

/// Translates byte offsets into the source text into zero-based line/column
/// locations. Columns count characters, not bytes.
#[derive(Debug, Eq, PartialEq)]
pub struct Humanizer(LineIndex);

impl Humanizer {
    pub fn new(input: &str) -> Self {
        Self(LineIndex::new(input))
    }

    /// `None` for offsets past the end of the input.
    pub fn run(&self, offset: usize) -> Option<SourceLocation> {
        let offset = u32::try_from(offset).ok()?;
        let utf8_pos = self.0.try_line_col(TextSize::new(offset))?;
        let wide_pos = self.0.to_wide(WideEncoding::Utf32, utf8_pos)?;
        Some(SourceLocation { line: wide_pos.line, column: wide_pos.col })
    }

    pub fn span(&self, start: usize, end: usize) -> Option<SourceSpan> {
        Some(SourceSpan::new(self.run(start)?, self.run(end)?))
    }
}
