use anyhow::Result;
use printpdf::{
    BuiltinFont, Color, Greyscale, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, Rgb,
    TextItem,
};

use crate::metrics::PRINT_SHEETS_TOTAL;
use crate::models::{PrintOption, Question};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const TOP_Y: f32 = 275.0;
const LINE_STEP: f32 = 6.0;

/// Builds A4 question sheets with one of three levels of detail:
/// questions only, with the correct choice marked, or with explanations.
pub struct PrintService;

impl PrintService {
    pub fn build_sheet(
        title: &str,
        questions: &[Question],
        option: PrintOption,
    ) -> Result<Vec<u8>> {
        let accent_color = Color::Rgb(Rgb {
            r: 0.16,
            g: 0.4,
            b: 0.69,
            icc_profile: None,
        });
        let text_color = Color::Greyscale(Greyscale::new(0.08, None));
        let muted_color = Color::Greyscale(Greyscale::new(0.4, None));

        let mut pages: Vec<PdfPage> = Vec::new();
        let mut ops: Vec<Op> = Vec::new();
        let mut y = TOP_Y;

        Self::push_pdf_text(
            &mut ops,
            Point::new(Mm(MARGIN_LEFT), Mm(y)),
            BuiltinFont::HelveticaBold,
            16.0,
            20.0,
            title.to_string(),
            &accent_color,
        );
        y -= 2.0 * LINE_STEP;

        let subtitle = match option {
            PrintOption::QuestionsOnly => "Questions only",
            PrintOption::WithAnswers => "With answers",
            PrintOption::WithExplanations => "With answers and explanations",
        };
        Self::push_pdf_text(
            &mut ops,
            Point::new(Mm(MARGIN_LEFT), Mm(y)),
            BuiltinFont::HelveticaOblique,
            10.0,
            12.0,
            format!("{} questions • {}", questions.len(), subtitle),
            &muted_color,
        );
        y -= 2.0 * LINE_STEP;

        for (index, question) in questions.iter().enumerate() {
            let mut block: Vec<(String, BuiltinFont, f32, Color)> = Vec::new();

            for line in wrap_text(&format!("{}. {}", index + 1, question.question), 88) {
                block.push((line, BuiltinFont::HelveticaBold, 11.0, text_color.clone()));
            }
            for (ci, choice) in question.choices.iter().enumerate() {
                let marker = if option != PrintOption::QuestionsOnly && ci == question.answer {
                    "[v]"
                } else {
                    "   "
                };
                for line in wrap_text(&format!("  {} {}) {}", marker, ci + 1, choice), 88) {
                    let color = if option != PrintOption::QuestionsOnly && ci == question.answer {
                        accent_color.clone()
                    } else {
                        text_color.clone()
                    };
                    block.push((line, BuiltinFont::Helvetica, 10.0, color));
                }
            }
            if option == PrintOption::WithExplanations && !question.explanation.is_empty() {
                for line in wrap_text(&format!("  Explanation: {}", question.explanation), 88) {
                    block.push((line, BuiltinFont::HelveticaOblique, 9.0, muted_color.clone()));
                }
            }

            let block_height = block.len() as f32 * LINE_STEP + LINE_STEP;
            if y - block_height < MARGIN_BOTTOM {
                pages.push(PdfPage::new(
                    Mm(PAGE_WIDTH_MM),
                    Mm(PAGE_HEIGHT_MM),
                    std::mem::take(&mut ops),
                ));
                y = TOP_Y;
            }

            for (line, font, size, color) in block {
                Self::push_pdf_text(
                    &mut ops,
                    Point::new(Mm(MARGIN_LEFT), Mm(y)),
                    font,
                    size,
                    size + 2.0,
                    line,
                    &color,
                );
                y -= LINE_STEP;
            }
            y -= LINE_STEP;
        }

        pages.push(PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops));

        let mut document = PdfDocument::new(title);
        let mut warnings = Vec::new();
        let bytes = document
            .with_pages(pages)
            .save(&PdfSaveOptions::default(), &mut warnings);

        let option_label = match option {
            PrintOption::QuestionsOnly => "questionsOnly",
            PrintOption::WithAnswers => "withAnswers",
            PrintOption::WithExplanations => "withExplanations",
        };
        PRINT_SHEETS_TOTAL.with_label_values(&[option_label]).inc();

        Ok(bytes)
    }

    fn push_pdf_text(
        ops: &mut Vec<Op>,
        pos: Point,
        font: BuiltinFont,
        font_size: f32,
        line_height: f32,
        text: String,
        color: &Color,
    ) {
        ops.extend([
            Op::StartTextSection,
            Op::SetTextCursor { pos },
            Op::SetFontSizeBuiltinFont {
                size: Pt(font_size),
                font,
            },
            Op::SetLineHeight {
                lh: Pt(line_height),
            },
            Op::SetFillColor { col: color.clone() },
            Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(text)],
                font,
            },
            Op::EndTextSection,
        ]);
    }
}

/// Greedy word wrap; long words are emitted on their own line unbroken.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
        Question {
            id: 1,
            question: "What is the unit of electrical resistance?".to_string(),
            choices: vec!["Volt".into(), "Ohm".into(), "Ampere".into(), "Watt".into()],
            answer: 1,
            explanation: "Resistance is measured in ohms.".to_string(),
            hint: None,
            subject: None,
        }
    }

    #[test]
    fn produces_a_pdf_for_each_option() {
        for option in [
            PrintOption::QuestionsOnly,
            PrintOption::WithAnswers,
            PrintOption::WithExplanations,
        ] {
            let bytes =
                PrintService::build_sheet("CBT practice sheet", &[sample_question()], option)
                    .unwrap();
            assert!(bytes.starts_with(b"%PDF"));
        }
    }

    #[test]
    fn wrap_respects_max_width() {
        let lines = wrap_text("one two three four five six seven", 9);
        assert!(lines.iter().all(|l| l.chars().count() <= 9));
        assert_eq!(lines.concat().replace(' ', ""), "onetwothreefourfivesixseven");
    }
}
