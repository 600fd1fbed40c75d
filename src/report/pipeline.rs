//! One report run, from template and records to the finished presentation.
//!
//! The run moves through fixed stages:
//!
//! 1. `LOAD_TEMPLATE`: open the template and resolve the fixed slides
//! 2. `AGGREGATE`: fetch records and group them
//! 3. `POPULATE_FIXED_SLIDES`: cover, summary, insights and blogs
//! 4. `PAGINATE_VARIABLE_SLIDES`: project and plan series
//! 5. `FINALIZE`: write the output file
//!
//! Any error aborts the run before `FINALIZE`, so no partial output is
//! ever written.

use std::fmt;
use std::path::PathBuf;

use crate::ooxml::opc::PackURI;
use crate::ooxml::pptx::{Package, TableLocator};
use crate::report::aggregate::{Aggregate, Aggregator, Group};
use crate::report::config::ReportConfig;
use crate::report::error::{ReportError, Result};
use crate::report::paginate::{page_at, series_len};
use crate::report::populate::{
    Sampler, fill_column, fill_groups, stamp_cover, write_insights_and_blogs,
};
use crate::source::{DateRange, RecordSource};

/// Template slide positions.
pub const COVER_SLIDE: usize = 0;
pub const SUMMARY_SLIDE: usize = 2;
pub const PROJECT_SEED_SLIDE: usize = 3;
pub const PLAN_SEED_SLIDE: usize = 4;
pub const INSIGHTS_SLIDE: usize = 5;
pub const REQUIRED_SLIDES: usize = 6;

const LEARNINGS_HEADER: &str = "learn";
const PROJECTS_HEADER: &str = "project";
const TEACH_HEADER: &str = "teach";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadTemplate,
    Aggregate,
    PopulateFixedSlides,
    PaginateVariableSlides,
    Finalize,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::LoadTemplate => "LOAD_TEMPLATE",
            RunStage::Aggregate => "AGGREGATE",
            RunStage::PopulateFixedSlides => "POPULATE_FIXED_SLIDES",
            RunStage::PaginateVariableSlides => "PAGINATE_VARIABLE_SLIDES",
            RunStage::Finalize => "FINALIZE",
        };
        f.write_str(name)
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    /// Seed the samples were drawn with
    pub seed: u64,
    pub records: usize,
    pub work_groups: usize,
    pub plan_groups: usize,
    /// Slides in the project series, seed slide included
    pub project_slides: usize,
    /// Slides in the plan series, seed slide included
    pub plan_slides: usize,
    pub output: PathBuf,
}

impl ReportSummary {
    /// Slides added to the template by pagination.
    pub fn slides_added(&self) -> usize {
        self.project_slides.saturating_sub(1) + self.plan_slides.saturating_sub(1)
    }
}

/// Partnames of the fixed slides, resolved before any slide is added.
#[derive(Debug, Clone)]
struct TemplateLayout {
    cover: PackURI,
    summary: PackURI,
    project_seed: PackURI,
    plan_seed: PackURI,
    insights: PackURI,
}

impl TemplateLayout {
    fn resolve(package: &Package) -> Result<Self> {
        let slides = package.slide_partnames()?;
        if slides.len() < REQUIRED_SLIDES {
            return Err(ReportError::TooFewSlides {
                found: slides.len(),
                required: REQUIRED_SLIDES,
            });
        }
        Ok(Self {
            cover: slides[COVER_SLIDE].clone(),
            summary: slides[SUMMARY_SLIDE].clone(),
            project_seed: slides[PROJECT_SEED_SLIDE].clone(),
            plan_seed: slides[PLAN_SEED_SLIDE].clone(),
            insights: slides[INSIGHTS_SLIDE].clone(),
        })
    }
}

struct StageTracker {
    current: RunStage,
}

impl StageTracker {
    fn start() -> Self {
        log::info!("stage {}", RunStage::LoadTemplate);
        Self {
            current: RunStage::LoadTemplate,
        }
    }

    fn advance(&mut self, next: RunStage) {
        log::info!("stage {} -> {}", self.current, next);
        self.current = next;
    }
}

/// Generate the report for `range` and write it to `config.output`.
///
/// `open_source` is called once the template has been validated; the source
/// it returns is queried once and dropped before any slide is modified.
pub fn generate<S, F>(config: &ReportConfig, open_source: F, range: &DateRange) -> Result<ReportSummary>
where
    S: RecordSource,
    F: FnOnce() -> Result<S>,
{
    let mut stages = StageTracker::start();
    let mut package = Package::open(&config.template)?;
    let layout = TemplateLayout::resolve(&package)?;

    stages.advance(RunStage::Aggregate);
    let source = open_source()?;
    let records = source.fetch(range)?;
    drop(source);
    let aggregate = Aggregator::new(config.separator, config.link_prefix.as_str()).aggregate(&records);
    log::info!(
        "{} record(s): {} project(s), {} plan(s), {} learning(s), {} support item(s), {} insight(s), {} blog(s)",
        records.len(),
        aggregate.work.len(),
        aggregate.plans.len(),
        aggregate.learnings.len(),
        aggregate.support.len(),
        aggregate.insights.len(),
        aggregate.blogs.len()
    );

    stages.advance(RunStage::PopulateFixedSlides);
    let seed = config.seed.unwrap_or_else(rand::random::<u64>);
    log::info!("sampling with seed {}", seed);
    let mut sampler = Sampler::new(seed);
    let (summary_groups, series_groups) = aggregate
        .work
        .as_slice()
        .split_at(config.summary_chunk_size.get().min(aggregate.work.len()));

    stamp_cover_slide(&mut package, &layout.cover, config, range)?;
    populate_summary(&mut package, &layout.summary, &aggregate, summary_groups, &mut sampler, config)?;
    populate_insights(&mut package, &layout.insights, &aggregate, &mut sampler, config)?;

    stages.advance(RunStage::PaginateVariableSlides);
    let project_slides = populate_project_series(
        &mut package,
        &layout.project_seed,
        series_groups,
        &aggregate.support,
        config,
    )?;
    let plan_slides = populate_plan_series(
        &mut package,
        &layout.plan_seed,
        aggregate.plans.as_slice(),
        config,
    )?;

    stages.advance(RunStage::Finalize);
    let bytes = package.to_bytes()?;
    std::fs::write(&config.output, bytes)?;

    let summary = ReportSummary {
        seed,
        records: records.len(),
        work_groups: aggregate.work.len(),
        plan_groups: aggregate.plans.len(),
        project_slides,
        plan_slides,
        output: config.output.clone(),
    };
    log::info!(
        "wrote {} ({} slide(s) added)",
        summary.output.display(),
        summary.slides_added()
    );
    Ok(summary)
}

fn stamp_cover_slide(
    package: &mut Package,
    partname: &PackURI,
    config: &ReportConfig,
    range: &DateRange,
) -> Result<()> {
    let mut cover = package.slide(partname)?;
    if stamp_cover(&mut cover, &config.cover_marker, &config.location, &range.period_label()) {
        package.store_slide(&cover)?;
    } else {
        log::warn!(
            "no shape containing {:?} on {}; cover left unchanged",
            config.cover_marker,
            partname
        );
    }
    Ok(())
}

/// Learnings sample into the learnings table, first project groups into
/// the projects table.
fn populate_summary(
    package: &mut Package,
    partname: &PackURI,
    aggregate: &Aggregate,
    groups: &[Group],
    sampler: &mut Sampler,
    config: &ReportConfig,
) -> Result<()> {
    let learnings = sampler.sample(&aggregate.learnings, config.learnings_cap);
    let mut slide = package.slide(partname)?;
    let (mut learnings_done, mut projects_done) = (false, false);

    // Each table takes the first role its header matches.
    for mut table in slide.tables_mut() {
        if !learnings_done && table.header_contains(LEARNINGS_HEADER) {
            let last = table.column_count().saturating_sub(1);
            fill_column(&mut table, last, &learnings)?;
            learnings_done = true;
        } else if !projects_done && table.header_contains(PROJECTS_HEADER) {
            fill_groups(&mut table, groups)?;
            projects_done = true;
        }
    }

    if !learnings_done {
        log::warn!("no learnings table on {}", partname);
    }
    if !projects_done {
        log::warn!("no projects table on {}", partname);
    }
    log::debug!(
        "{}: {} learning(s), {} project group(s)",
        partname,
        learnings.len(),
        groups.len()
    );
    package.store_slide(&slide)?;
    Ok(())
}

fn populate_insights(
    package: &mut Package,
    partname: &PackURI,
    aggregate: &Aggregate,
    sampler: &mut Sampler,
    config: &ReportConfig,
) -> Result<()> {
    let insights = sampler.sample(&aggregate.insights, config.insights_cap);
    let mut slide = package.slide(partname)?;
    let mut frame = slide
        .first_blank_text_frame()
        .ok_or_else(|| ReportError::MissingPlaceholder(partname.to_string()))?;
    write_insights_and_blogs(&mut frame, &insights, &aggregate.blogs);
    package.store_slide(&slide)?;
    Ok(())
}

/// Project groups and support items share one series; page `n` of each
/// goes on slide `n`.
fn populate_project_series(
    package: &mut Package,
    seed: &PackURI,
    groups: &[Group],
    support: &[String],
    config: &ReportConfig,
) -> Result<usize> {
    let slides = series_len(&[
        (groups.len(), config.chunk_size),
        (support.len(), config.teach_chunk_size),
    ]);
    let series = expand_series(package, seed, slides)?;

    for (index, partname) in series.iter().enumerate() {
        let projects = page_at(groups, config.chunk_size, index);
        let teach = page_at(support, config.teach_chunk_size, index);
        let mut slide = package.slide(partname)?;

        match slide.find_table_by_header_substring(PROJECTS_HEADER) {
            Some(mut table) => {
                fill_groups(&mut table, projects)?;
            },
            None => log::warn!("no projects table on {}", partname),
        }
        match slide.find_table_by_header_substring(TEACH_HEADER) {
            Some(mut table) => {
                fill_column(&mut table, 0, teach)?;
            },
            None => log::warn!("no teach table on {}", partname),
        }

        log::debug!(
            "{} (page {}): {} project group(s), {} teach item(s)",
            partname,
            index,
            projects.len(),
            teach.len()
        );
        package.store_slide(&slide)?;
    }
    Ok(series.len())
}

/// Every table on a plan slide receives that slide's page of plan groups.
fn populate_plan_series(
    package: &mut Package,
    seed: &PackURI,
    groups: &[Group],
    config: &ReportConfig,
) -> Result<usize> {
    let slides = series_len(&[(groups.len(), config.plan_chunk_size)]);
    let series = expand_series(package, seed, slides)?;

    for (index, partname) in series.iter().enumerate() {
        let page = page_at(groups, config.plan_chunk_size, index);
        let mut slide = package.slide(partname)?;
        let mut tables = 0;
        for mut table in slide.tables_mut() {
            fill_groups(&mut table, page)?;
            tables += 1;
        }
        if tables == 0 {
            log::warn!("no tables on plan slide {}", partname);
        }
        log::debug!("{} (page {}): {} plan group(s)", partname, index, page.len());
        package.store_slide(&slide)?;
    }
    Ok(series.len())
}

/// The seed followed by `slides - 1` copies of it, in presentation order.
///
/// Copies are taken before anything is written to the seed and placed one
/// after another right behind it. A series always has at least the seed.
fn expand_series(package: &mut Package, seed: &PackURI, slides: usize) -> Result<Vec<PackURI>> {
    let mut series = vec![seed.clone()];
    for _ in 1..slides {
        let anchor = series.last().unwrap_or(seed).clone();
        let copy = package.duplicate_slide(seed, &anchor)?;
        series.push(copy);
    }
    Ok(series)
}
