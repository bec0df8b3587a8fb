use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use crate::{
    config::Config,
    error::{Error, Result, Stage},
    page::{AccessClass, PageSize},
    simulate::{SimulationReport, Simulator},
    stream::{self, ReferenceStream, StreamCounts},
    toolchain,
    trace::TraceFile,
};

pub struct Inputs {
    pub source: PathBuf,
    pub trace: PathBuf,
}

/// Compile, profile, split the trace into reference strings, then replay each
/// string through a fresh TLB per policy.
pub struct Pipeline {
    config: Config,
    page_size: PageSize,
    simulator: Simulator,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let page_size = config.check()?;
        let simulator = Simulator::new(config.heartbeat);
        Ok(Pipeline {
            config,
            page_size,
            simulator,
        })
    }

    pub fn run(&self, inputs: &Inputs) -> Result<Vec<SimulationReport>> {
        if self.config.skip_profile {
            log::info!("Using existing trace {}", inputs.trace.display());
        } else {
            let exe = self.config.executable_path();
            toolchain::compile(&self.config.compiler, &inputs.source, &exe)?;
            toolchain::profile(&self.config.profiler, &exe, &inputs.trace)?;
        }

        let counts = self.build_references(&inputs.trace)?;
        log::info!(
            "{} instruction pages and {} data pages in the reference string",
            counts.instruction,
            counts.data
        );

        let mut reports = Vec::new();
        for class in [AccessClass::Instruction, AccessClass::Data] {
            log::info!("Simulating {} TLB", class);
            let stream = ReferenceStream::load(&self.config.refs_path(class), class)?;
            reports.extend(self.simulate(&stream)?);
        }
        Ok(reports)
    }

    /// Streams the trace once, writing both reference strings to the work directory.
    pub fn build_references(&self, trace: &Path) -> Result<StreamCounts> {
        let trace = TraceFile::open(trace)?;
        let work_dir = &self.config.work_dir;
        fs::create_dir_all(work_dir).map_err(Error::io(Stage::References, work_dir))?;

        let mut instruction = self.create_refs(AccessClass::Instruction)?;
        let mut data = self.create_refs(AccessClass::Data)?;

        let mut events = trace.events()?;
        let counts = stream::split_into(
            events.by_ref(),
            self.page_size,
            &mut instruction,
            &mut data,
        )
        .map_err(Error::io(Stage::References, work_dir))?;
        let summary = events.finish()?;
        log::debug!(
            "{}: {} lines, {} events, {} skipped",
            trace.path().display(),
            summary.lines,
            summary.events,
            summary.skipped
        );
        Ok(counts)
    }

    pub fn simulate(&self, stream: &ReferenceStream) -> Result<Vec<SimulationReport>> {
        self.config
            .to_tlbs(stream.class())?
            .into_iter()
            .map(|mut tlb| self.simulator.run(tlb.as_mut(), stream))
            .collect()
    }

    fn create_refs(&self, class: AccessClass) -> Result<BufWriter<fs::File>> {
        let path = self.config.refs_path(class);
        let file = fs::File::create(&path).map_err(Error::io(Stage::References, &path))?;
        Ok(BufWriter::new(file))
    }
}
