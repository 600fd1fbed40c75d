/// Writing aggregated data into template tables and text frames.
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::ooxml::pptx::{GrowOutcome, ParagraphFormat, Slide, TableMut, TextFrameMut};
use crate::report::aggregate::Group;
use crate::report::error::Result;

const HEADING_SIZE_PT: u16 = 18;
const ITEM_SIZE_PT: u16 = 14;

/// Details as a bulleted block: every detail on its own line after a
/// leading line break, each prefixed with `- `.
pub fn bullet_list(details: &[String]) -> String {
    let mut out = String::new();
    for detail in details {
        out.push_str("\n- ");
        out.push_str(detail);
    }
    out
}

/// Fill a two-column group table: key in column 0, bulleted details in
/// column 1, one group per body row.
///
/// Returns the number of rows written; a table without any row to clone
/// is left untouched.
pub fn fill_groups(table: &mut TableMut<'_>, groups: &[Group]) -> Result<usize> {
    if !make_room(table, groups.len()) {
        return Ok(0);
    }
    for (i, group) in groups.iter().enumerate() {
        table.set_cell_text(i + 1, 0, group.key())?;
        table.set_cell_text(i + 1, 1, &bullet_list(group.details()))?;
    }
    Ok(groups.len())
}

/// Fill column `col` with one item per body row.
pub fn fill_column(table: &mut TableMut<'_>, col: usize, items: &[String]) -> Result<usize> {
    if !make_room(table, items.len()) {
        return Ok(0);
    }
    for (i, item) in items.iter().enumerate() {
        table.set_cell_text(i + 1, col, item)?;
    }
    Ok(items.len())
}

/// Grow `table` to a header plus `rows` body rows.
fn make_room(table: &mut TableMut<'_>, rows: usize) -> bool {
    if rows == 0 {
        return true;
    }
    !matches!(table.grow_rows_to(rows + 1), GrowOutcome::NoTemplateRow)
}

/// Seeded source of random samples.
///
/// The same seed always yields the same samples, so a run can be replayed
/// from the seed it logged.
#[derive(Debug)]
pub struct Sampler {
    seed: u64,
    rng: StdRng,
}

impl Sampler {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Up to `cap` distinct elements of `items`, in draw order.
    pub fn sample<T: Clone>(&mut self, items: &[T], cap: usize) -> Vec<T> {
        let amount = cap.min(items.len());
        rand::seq::index::sample(&mut self.rng, items.len(), amount)
            .into_iter()
            .map(|i| items[i].clone())
            .collect()
    }
}

/// Stamp location and period on the cover slide.
///
/// In every shape whose text contains `marker`, each paragraph with an `@`
/// keeps the text before it and gets `@  {location} \t\t {period}`.
/// Returns `false` when no shape carries the marker.
pub fn stamp_cover(slide: &mut Slide, marker: &str, location: &str, period: &str) -> bool {
    let mut matched = 0;
    let mut stamped = 0;
    for frame in slide.text_frames_mut().iter_mut() {
        if !frame.text().contains(marker) {
            continue;
        }
        matched += 1;
        stamped += frame.rewrite_paragraphs(|text| {
            text.split_once('@')
                .map(|(before, _)| format!("{}@  {} \t\t {}", before, location, period))
        });
    }
    log::debug!("stamped {} cover paragraph(s) in {} shape(s)", stamped, matched);
    matched > 0
}

/// Rewrite a text frame as the insights and blogs block.
pub fn write_insights_and_blogs(frame: &mut TextFrameMut<'_>, insights: &[String], blogs: &[String]) {
    let heading = ParagraphFormat::level(0).bold().size(HEADING_SIZE_PT);
    let item = ParagraphFormat::level(1).size(ITEM_SIZE_PT);

    frame.clear();
    frame.set_first_paragraph("Insights:", heading);
    for insight in insights {
        frame.add_paragraph(insight, item);
    }
    frame.add_empty_paragraph();
    frame.add_paragraph("Blogs:", heading.no_bullet());
    for blog in blogs {
        frame.add_paragraph(blog, item);
    }
}
