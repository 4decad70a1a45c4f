//! Tesseract OCR engine driven through its command-line interface.

use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

use image::{GrayImage, ImageFormat};
use tracing::{debug, info, trace};

use crate::error::OcrError;
use crate::models::config::{OcrConfig, TokenGranularity};

use super::{OcrEngine, OcrToken};

/// TSV row level for a single recognized word.
const WORD_LEVEL: &str = "5";

/// OCR engine backed by the `tesseract` executable.
pub struct TesseractEngine {
    program: PathBuf,
    granularity: TokenGranularity,
    version: String,
}

impl TesseractEngine {
    /// Locate the tesseract executable and confirm it runs.
    pub fn new(program: impl Into<PathBuf>, granularity: TokenGranularity) -> Result<Self, OcrError> {
        let program = program.into();

        let output = Command::new(&program).arg("--version").output().map_err(|e| {
            OcrError::EngineUnavailable(format!("{} could not be started: {}", program.display(), e))
        })?;

        if !output.status.success() {
            return Err(OcrError::EngineUnavailable(format!(
                "{} --version exited with {}",
                program.display(),
                output.status
            )));
        }

        // Older releases print the banner on stderr.
        let banner = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        let version = String::from_utf8_lossy(&banner)
            .lines()
            .next()
            .unwrap_or("tesseract")
            .trim()
            .to_string();

        info!("Using {} ({:?} tokens)", version, granularity);

        Ok(Self {
            program,
            granularity,
            version,
        })
    }

    /// Create an engine from OCR configuration.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        Self::new(&config.tesseract_path, config.granularity)
    }

    /// Version banner reported at startup.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage, language: &str) -> Result<Vec<OcrToken>, OcrError> {
        let start = Instant::now();

        let input = tempfile::Builder::new()
            .prefix("billie_ocr_")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Recognition(format!("failed to create temp file: {}", e)))?;

        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| OcrError::Recognition(format!("failed to write page image: {}", e)))?;

        let output = Command::new(&self.program)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .arg("tsv")
            .output()
            .map_err(|e| OcrError::Recognition(format!("tesseract failed to start: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let tokens = parse_tsv(&output.stdout, self.granularity)?;

        debug!(
            "tesseract returned {} tokens in {}ms",
            tokens.len(),
            start.elapsed().as_millis()
        );

        Ok(tokens)
    }
}

/// Map a tesseract confidence (`0..=100`, `-1` for none) to `[0, 1]`.
fn normalize_confidence(raw: f32) -> f32 {
    (raw / 100.0).clamp(0.0, 1.0)
}

struct Word {
    line_key: (String, String, String, String),
    text: String,
    confidence: f32,
    top: i32,
}

/// Parse tesseract's TSV output into tokens.
pub(crate) fn parse_tsv(data: &[u8], granularity: TokenGranularity) -> Result<Vec<OcrToken>, OcrError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .has_headers(true)
        .from_reader(data);

    let mut words = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| OcrError::Output(e.to_string()))?;
        if record.get(0) != Some(WORD_LEVEL) {
            continue;
        }

        let field = |i: usize| record.get(i).unwrap_or("").trim();

        let text = field(11);
        if text.is_empty() {
            continue;
        }

        let confidence = field(10)
            .parse::<f32>()
            .map_err(|_| OcrError::Output(format!("bad confidence {:?}", field(10))))?;
        let top = field(7)
            .parse::<i32>()
            .map_err(|_| OcrError::Output(format!("bad top offset {:?}", field(7))))?;

        trace!("word {:?} conf={} top={}", text, confidence, top);

        words.push(Word {
            line_key: (
                field(1).to_string(),
                field(2).to_string(),
                field(3).to_string(),
                field(4).to_string(),
            ),
            text: text.to_string(),
            confidence: normalize_confidence(confidence),
            top,
        });
    }

    Ok(match granularity {
        TokenGranularity::Word => words
            .into_iter()
            .map(|w| OcrToken::new(w.text, w.confidence, w.top))
            .collect(),
        TokenGranularity::Line => merge_lines(words),
    })
}

/// Merge words sharing a (page, block, paragraph, line) key, keeping the
/// order in which lines first appear.
fn merge_lines(words: Vec<Word>) -> Vec<OcrToken> {
    let mut lines: Vec<(Word, usize)> = Vec::new();

    for word in words {
        match lines.last_mut() {
            Some((line, count)) if line.line_key == word.line_key => {
                line.text.push(' ');
                line.text.push_str(&word.text);
                line.confidence += word.confidence;
                line.top = line.top.min(word.top);
                *count += 1;
            }
            _ => lines.push((word, 1)),
        }
    }

    lines
        .into_iter()
        .map(|(line, count)| OcrToken::new(line.text, line.confidence / count as f32, line.top))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t2550\t3300\t-1\t
2\t1\t1\t0\t0\t0\t120\t98\t800\t60\t-1\t
3\t1\t1\t1\t0\t0\t120\t98\t800\t60\t-1\t
4\t1\t1\t1\t1\t0\t120\t98\t800\t60\t-1\t
5\t1\t1\t1\t1\t1\t120\t100\t200\t58\t96.5\tAcme
5\t1\t1\t1\t1\t2\t340\t98\t200\t60\t91.5\tCorp
5\t1\t1\t1\t1\t3\t560\t99\t200\t59\t-1\t \t
4\t1\t1\t1\t2\t0\t120\t200\t900\t60\t-1\t
5\t1\t1\t1\t2\t1\t120\t200\t300\t60\t88\tInvoice
5\t1\t1\t1\t2\t2\t440\t202\t300\t58\t80\t#INV-001
";

    #[test]
    fn test_parse_tsv_words() {
        let tokens = parse_tsv(SAMPLE.as_bytes(), TokenGranularity::Word).unwrap();

        assert_eq!(
            tokens,
            vec![
                OcrToken::new("Acme", 0.965, 100),
                OcrToken::new("Corp", 0.915, 98),
                OcrToken::new("Invoice", 0.88, 200),
                OcrToken::new("#INV-001", 0.8, 202),
            ]
        );
    }

    #[test]
    fn test_parse_tsv_lines() {
        let tokens = parse_tsv(SAMPLE.as_bytes(), TokenGranularity::Line).unwrap();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "Acme Corp");
        assert!((tokens[0].confidence - 0.94).abs() < 1e-6);
        assert_eq!(tokens[0].top, 98);
        assert_eq!(tokens[1].text, "Invoice #INV-001");
        assert!((tokens[1].confidence - 0.84).abs() < 1e-6);
    }

    #[test]
    fn test_parse_tsv_rejects_garbage_confidence() {
        let data = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
5\t1\t1\t1\t1\t1\t0\t0\t1\t1\tabc\tword
";
        let err = parse_tsv(data.as_bytes(), TokenGranularity::Word).unwrap_err();
        assert!(matches!(err, OcrError::Output(_)));
    }

    #[test]
    fn test_normalize_confidence() {
        assert_eq!(normalize_confidence(-1.0), 0.0);
        assert_eq!(normalize_confidence(50.0), 0.5);
        assert_eq!(normalize_confidence(100.0), 1.0);
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let err = TesseractEngine::new("/nonexistent/tesseract", TokenGranularity::Line)
            .err()
            .unwrap();
        assert!(matches!(err, OcrError::EngineUnavailable(_)));
    }
}
