use coconut_cache::{CacheBuilder, CacheError, LifecycleHooks, RunState};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

struct PrintHooks;

impl LifecycleHooks for PrintHooks {
  fn on_start(&self) {
    println!("[Hooks] started");
  }

  fn on_shutdown(&self, state: RunState) {
    println!("[Hooks] {state}");
  }

  fn on_terminated(&self) {
    println!("[Hooks] terminated");
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cache = Arc::new(
    CacheBuilder::<u64, String>::new()
      .name("sessions")
      .lifecycle_hooks(PrintHooks)
      .build()
      .expect("Failed to build cache"),
  );

  let writer = {
    let cache = cache.clone();
    thread::spawn(move || {
      let mut written = 0;
      loop {
        match cache.insert(written, format!("session-{written}")) {
          Ok(_) => written += 1,
          Err(CacheError::ShutDown(state)) => {
            println!("[Writer] stopped after {written} inserts ({state})");
            break;
          }
          Err(err) => panic!("{err}"),
        }
      }
    })
  };

  thread::sleep(Duration::from_millis(10));
  cache.shutdown().expect("shutdown refused");
  let terminated = cache.await_termination(Duration::from_secs(1));
  writer.join().expect("writer panicked");

  println!("Terminated: {terminated}, entries kept: {}", cache.len());
  println!("Reads still work: {:?}", cache.get(&0));
}
