use rigel_core::Simulator;
use rigel_core::config::Config;
use rigel_core::core::ThreadContext;
use rigel_core::isa::assemble;
use rigel_core::soc::CacheModel;
use rigel_core::stats::Stat;

/// A simulator built from assembly source, with accessors for the state tests inspect.
pub struct TestContext {
    pub sim: Simulator,
}

impl TestContext {
    /// Assembles `source` and builds a simulator with the default configuration.
    pub fn new(source: &str) -> Self {
        Self::with_config(source, Config::default())
    }

    /// Assembles `source` and builds a simulator with `config`.
    pub fn with_config(source: &str, config: Config) -> Self {
        init_tracing();
        let program = assemble(source).expect("test program assembles");
        let sim = Simulator::new(config, program).expect("simulator builds");
        Self { sim }
    }

    /// Builds a simulator around a caller-supplied cache model.
    pub fn with_cache(source: &str, config: Config, cache: Box<dyn CacheModel>) -> Self {
        init_tracing();
        let program = assemble(source).expect("test program assembles");
        let sim = Simulator::with_cache_model(config, program, cache).expect("simulator builds");
        Self { sim }
    }

    /// Runs to completion and asserts every thread halted.
    pub fn run(&mut self) -> &mut Self {
        let summary = self.sim.run().expect("run completes without a fatal error");
        assert!(summary.halted, "program did not halt within the cycle limit");
        self
    }

    /// Advances one cycle.
    pub fn tick(&mut self) {
        self.sim.tick().expect("cycle completes without a fatal error");
    }

    pub fn thread(&self, core: usize, thread: usize) -> &ThreadContext {
        &self.sim.cores[core].threads[thread]
    }

    /// Scalar register `r` of core 0, thread 0.
    pub fn reg(&self, r: usize) -> u32 {
        self.reg_of(0, 0, r)
    }

    pub fn reg_of(&self, core: usize, thread: usize, r: usize) -> u32 {
        self.thread(core, thread).regs.read(r).expect("register in range")
    }

    pub fn stat(&self, stat: Stat) -> u64 {
        self.sim.stats().get(stat)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
