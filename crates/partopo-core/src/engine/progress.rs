#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Reports `PhaseStart` now and `PhaseFinish` when the guard is dropped,
    /// including on early return through `?`.
    pub fn phase(&self, name: &'static str) -> PhaseGuard<'_, 'a> {
        self.report(Progress::PhaseStart { name });
        PhaseGuard { reporter: self }
    }

    /// Runs `f` as a counted task of `total_steps` steps. `f` receives a tick
    /// function to call once per completed step. Nothing is reported for an
    /// empty task.
    pub fn task<T>(&self, total_steps: usize, f: impl FnOnce(&dyn Fn()) -> T) -> T {
        if total_steps == 0 {
            return f(&|| {});
        }
        self.report(Progress::TaskStart {
            total_steps: total_steps as u64,
        });
        let result = f(&|| self.report(Progress::TaskIncrement));
        self.report(Progress::TaskFinish);
        result
    }
}

pub struct PhaseGuard<'r, 'a> {
    reporter: &'r ProgressReporter<'a>,
}

impl Drop for PhaseGuard<'_, '_> {
    fn drop(&mut self) {
        self.reporter.report(Progress::PhaseFinish);
    }
}
