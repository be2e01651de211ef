use std::{any::type_name, future::Future, pin::Pin, sync::Arc};

use ngw_model::{Bound, WorkKind};

use crate::dispatch::Dispatch;

/// Boxed future produced by async work (and by dispatched blocking work).
pub type BoxWorkFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// Synchronous job sent to a worker pool.
pub type BlockingJob = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Deferred async job; invoked once when the run actually starts.
pub type AsyncJob = Box<dyn FnOnce() -> BoxWorkFuture + Send + 'static>;

enum Body {
    Async(AsyncJob),
    Blocking { job: BlockingJob, bound: Bound },
}

/// Named, tagged unit of work.
pub struct Work {
    name: String,
    body: Body,
}

impl Work {
    /// Async work. `f` is not invoked until the run starts.
    pub fn future<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: callable_name::<F>(),
            body: Body::Async(Box::new(move || Box::pin(f()) as BoxWorkFuture)),
        }
    }

    /// Blocking work, dispatched to the I/O pool unless marked [`cpu_bound`](Self::cpu_bound).
    pub fn blocking<F>(f: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            name: callable_name::<F>(),
            body: Body::Blocking {
                job: Box::new(f),
                bound: Bound::Io,
            },
        }
    }

    /// Overrides the name derived from the callable.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Routes blocking work to the CPU pool. No effect on async work.
    pub fn cpu_bound(mut self) -> Self {
        if let Body::Blocking { bound, .. } = &mut self.body {
            *bound = Bound::Cpu;
        }
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> WorkKind {
        match self.body {
            Body::Async(_) => WorkKind::Async,
            Body::Blocking { .. } => WorkKind::Blocking,
        }
    }

    /// Pool hint; `None` for async work.
    pub fn bound(&self) -> Option<Bound> {
        match self.body {
            Body::Async(_) => None,
            Body::Blocking { bound, .. } => Some(bound),
        }
    }

    /// Turns the work into a single future.
    ///
    /// Blocking work is handed to `dispatch`; `force_cpu` sends it to the CPU
    /// pool regardless of its own hint.
    pub(crate) fn into_future(self, dispatch: Arc<dyn Dispatch>, force_cpu: bool) -> BoxWorkFuture {
        match self.body {
            Body::Async(job) => job(),
            Body::Blocking { job, bound } => {
                let cpu = force_cpu || bound == Bound::Cpu;
                Box::pin(async move {
                    if cpu {
                        dispatch.run_cpu_bound(job).await
                    } else {
                        dispatch.run_io_bound(job).await
                    }
                })
            }
        }
    }
}

impl std::fmt::Debug for Work {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Work")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("bound", &self.bound())
            .finish()
    }
}

/// Last path segment of the callable's type, closure markers removed.
///
/// `app::search::refresh` and `app::search::refresh::{{closure}}` both yield `refresh`.
fn callable_name<F>() -> String {
    short_name(type_name::<F>())
}

const FALLBACK_NAME: &str = "work";

fn short_name(full: &str) -> String {
    let mut path = full;
    while let Some(stripped) = path.strip_suffix("::{{closure}}") {
        path = stripped;
    }

    // drop every `<...>` group (generic args, `<T as Trait>` qualifiers), nesting included
    let mut flat = String::with_capacity(path.len());
    let mut depth = 0usize;
    let mut prev = '\0';
    for c in path.chars() {
        match c {
            '<' => depth += 1,
            '>' if prev != '-' => depth = depth.saturating_sub(1),
            _ if depth == 0 => flat.push(c),
            _ => {}
        }
        prev = c;
    }

    match flat.rsplit("::").next() {
        Some(last) if !last.is_empty() && last.chars().all(|c| c.is_alphanumeric() || c == '_') => {
            last.to_string()
        }
        _ => FALLBACK_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::InlineDispatch;

    fn rebuild_index() -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn name_is_derived_from_fn_item() {
        let work = Work::blocking(rebuild_index);
        assert_eq!(work.name(), "rebuild_index");
        assert_eq!(work.kind(), WorkKind::Blocking);
        assert_eq!(work.bound(), Some(Bound::Io));
    }

    #[test]
    fn closure_name_falls_back_to_enclosing_fn() {
        let work = Work::future(|| async { Ok(()) });
        assert_eq!(work.name(), "closure_name_falls_back_to_enclosing_fn");
        assert_eq!(work.kind(), WorkKind::Async);
        assert_eq!(work.bound(), None);
    }

    trait Panel {
        fn refresh(&self) -> Work;
    }

    struct Search;

    impl Panel for Search {
        fn refresh(&self) -> Work {
            Work::future(|| async { Ok(()) })
        }
    }

    struct Grid<T>(std::marker::PhantomData<T>);

    impl<T: Send + 'static> Grid<T> {
        fn reload(&self) -> Work {
            Work::blocking(|| Ok(()))
        }
    }

    #[test]
    fn trait_impl_closure_takes_method_name() {
        assert_eq!(Search.refresh().name(), "refresh");
    }

    #[test]
    fn generic_impl_closure_takes_method_name() {
        let grid = Grid::<u8>(std::marker::PhantomData);
        assert_eq!(grid.reload().name(), "reload");
    }

    #[test]
    fn short_name_strips_nested_angle_groups() {
        assert_eq!(short_name("<app::Search as app::Panel>::refresh::{{closure}}"), "refresh");
        assert_eq!(short_name("app::Grid<alloc::vec::Vec<u8>>::reload::{{closure}}::{{closure}}"), "reload");
        assert_eq!(short_name("app::load<u8>"), "load");
    }

    #[test]
    fn short_name_never_returns_empty() {
        assert_eq!(short_name(""), "work");
        assert_eq!(short_name("<app::Search as app::Panel>"), "work");
        assert_eq!(short_name("fn() -> core::result::Result<(), anyhow::Error>"), "Result");
    }

    #[test]
    fn named_and_cpu_bound_override_defaults() {
        let work = Work::blocking(rebuild_index).named("reindex").cpu_bound();
        assert_eq!(work.name(), "reindex");
        assert_eq!(work.bound(), Some(Bound::Cpu));

        let work = Work::future(|| async { Ok(()) }).cpu_bound();
        assert_eq!(work.bound(), None);
    }

    #[tokio::test]
    async fn blocking_work_runs_through_dispatch() {
        let hit = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&hit);
        let work = Work::blocking(move || {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        });

        work.into_future(Arc::new(InlineDispatch), false).await.unwrap();
        assert!(hit.load(std::sync::atomic::Ordering::SeqCst));
    }
}
