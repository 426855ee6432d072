//! Paginated plain-text export of a plan's four sections

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::template::PlanOutputs;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const HEADER_PREFIX: &str = "AI Life Organizer – ";
const FALLBACK_SLUG: &str = "organizer";
const PAGE_BREAK: &str = "\u{c}\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub pages: Vec<Page>,
    margin: usize,
}

/// Lay out the plan: header, then the four sections in fixed order. A section
/// starts a new page when what is left of the current one cannot hold it.
pub fn render(title: &str, outputs: &PlanOutputs, layout: &ExportConfig) -> Document {
    let width = layout.page_width.saturating_sub(layout.margin * 2).max(1);
    let height = layout.page_height.saturating_sub(layout.margin * 2).max(1);

    let sections = [
        ("Plan financiero", outputs.finanzas.as_str()),
        ("Hábitos esenciales", outputs.habitos.as_str()),
        ("Horario sugerido", outputs.horario.as_str()),
        ("Prioridades próximos 7 días", outputs.siete_dias.as_str()),
    ];

    let mut pages: Vec<Page> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in textwrap::wrap(&format!("{}{}", HEADER_PREFIX, title), width) {
        push_line(&mut pages, &mut current, center(&line, width), height);
    }
    if current.len() < height {
        current.push(String::new());
    }

    for (heading, text) in sections {
        let mut block = vec![heading.to_string(), "-".repeat(textwrap::core::display_width(heading))];
        block.extend(textwrap::wrap(text, width).into_iter().map(|l| l.into_owned()));

        let remaining = height.saturating_sub(current.len());
        if block.len() > remaining && !current.is_empty() {
            pages.push(Page {
                lines: std::mem::take(&mut current),
            });
        }

        // Sections taller than a whole page flow over
        for line in block {
            push_line(&mut pages, &mut current, line, height);
        }
        if current.len() < height {
            current.push(String::new());
        }
    }

    if !current.is_empty() {
        pages.push(Page { lines: current });
    }

    Document {
        file_name: format!("plan-{}.txt", slugify(title)),
        pages,
        margin: layout.margin,
    }
}

impl Document {
    /// The document as text, pages separated by form feeds
    pub fn to_text(&self) -> String {
        let indent = " ".repeat(self.margin);
        let top = "\n".repeat(self.margin);
        self.pages
            .iter()
            .map(|page| {
                let mut out = top.clone();
                for line in &page.lines {
                    if line.is_empty() {
                        out.push('\n');
                    } else {
                        out.push_str(&indent);
                        out.push_str(line);
                        out.push('\n');
                    }
                }
                out
            })
            .collect::<Vec<_>>()
            .join(PAGE_BREAK)
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(dir).map_err(ExportError::CreateDir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, self.to_text()).map_err(ExportError::Write)?;
        info!("Exported {} pages to {:?}", self.pages.len(), path);
        Ok(path)
    }
}

/// Lowercase, runs of anything outside `a-z0-9` collapsed to `-`, trimmed
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let collapsed = match Regex::new(r"[^a-z0-9]+") {
        Ok(re) => re.replace_all(&lower, "-").into_owned(),
        Err(_) => lower,
    };
    let slug = collapsed.trim_matches('-');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Append a line, breaking to a new page when the current one is full
fn push_line(pages: &mut Vec<Page>, current: &mut Vec<String>, line: String, height: usize) {
    if current.len() == height {
        pages.push(Page {
            lines: std::mem::take(current),
        });
    }
    current.push(line);
}

fn center(line: &str, width: usize) -> String {
    let pad = width.saturating_sub(textwrap::core::display_width(line)) / 2;
    format!("{}{}", " ".repeat(pad), line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{generate, PlanInputs};

    fn layout(width: usize, height: usize) -> ExportConfig {
        ExportConfig {
            page_width: width,
            page_height: height,
            margin: 2,
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Mi Plan de Claridad"), "mi-plan-de-claridad");
        assert_eq!(slugify("  ¡Año 2024!  "), "a-o-2024");
        assert_eq!(slugify("---"), "organizer");
        assert_eq!(slugify("ñ"), "organizer");
    }

    #[test]
    fn test_sections_in_fixed_order_on_one_page() {
        let outputs = generate(&PlanInputs::default());
        let doc = render("Enero", &outputs, &layout(100, 200));

        assert_eq!(doc.file_name, "plan-enero.txt");
        assert_eq!(doc.pages.len(), 1);
        let text = doc.to_text();
        assert!(text.contains("AI Life Organizer – Enero"));
        let order: Vec<usize> = [
            "Plan financiero",
            "Hábitos esenciales",
            "Horario sugerido",
            "Prioridades próximos 7 días",
        ]
        .iter()
        .map(|h| text.find(h).unwrap())
        .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_section_moves_to_next_page_when_it_does_not_fit() {
        let outputs = generate(&PlanInputs::default());
        let doc = render("Paginado", &outputs, &layout(44, 24));

        assert!(doc.pages.len() > 1);
        for page in &doc.pages {
            assert!(page.lines.len() <= 20);
        }
        // Every section heading opens its block; none is split from its underline
        for page in &doc.pages {
            if let Some(last) = page.lines.iter().rposition(|l| !l.is_empty()) {
                let line = &page.lines[last];
                assert!(!line.starts_with("Plan financiero"));
                assert!(!line.starts_with("Horario sugerido"));
            }
        }
        assert!(doc.to_text().contains('\u{c}'));
    }

    #[test]
    fn test_oversized_section_flows_across_pages() {
        let outputs = PlanOutputs {
            finanzas: "palabra ".repeat(400),
            ..generate(&PlanInputs::default())
        };
        let doc = render("Largo", &outputs, &layout(40, 20));
        assert!(doc.pages.len() >= 3);
        assert!(doc.pages.iter().all(|p| p.lines.len() <= 16));
    }

    #[test]
    fn test_long_title_never_overfills_a_page() {
        let title = "palabra ".repeat(80);
        let doc = render(&title, &PlanOutputs::placeholder(), &layout(32, 14));

        assert!(doc.pages.len() >= 3);
        assert!(doc.pages.iter().all(|p| p.lines.len() <= 10));
        assert!(doc.pages[0].lines[0].contains("AI Life Organizer"));
    }

    #[test]
    fn test_write_to_uses_slug_name() {
        let dir = tempfile::tempdir().unwrap();
        let doc = render("Plan: Mayo", &PlanOutputs::placeholder(), &layout(80, 60));
        let path = doc.write_to(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "plan-plan-mayo.txt");
        assert!(fs::read_to_string(path).unwrap().contains("Plan financiero"));
    }
}
