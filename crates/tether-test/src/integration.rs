//! End-to-end scenarios
//!
//! Exercise the full path a notification takes:
//! - Producer -> converted sink -> promise observers
//! - Producer -> converted sink -> reactor queue -> process pass
//! - Result callbacks and simple callbacks chained through both converters
//! - Deadline sweeps racing producers

use tether_bridge::{convert_promise, convert_promise_on};
use tether_core::{Callback, Promise};
use tether_reactor::{ProcessReport, Reactor};

use crate::{Employee, SharedRef};

// ============================================================================
// SCENARIO DRIVERS
// ============================================================================

/// Settle a fresh promise through a converted simple callback and report
/// what its success observer saw
pub fn settle_through_callback(name: &str) -> (Promise<Employee>, SharedRef<Employee>) {
    let seen = SharedRef::new();
    let promise = Promise::new();
    {
        let seen = seen.clone();
        promise.then(move |employee: &Employee| seen.set(employee.clone()));
    }

    convert_promise(&promise).success(Employee::new(name));
    (promise, seen)
}

/// Fan `count` producers out over threads, each settling its own promise
/// through `reactor`, then drain once
pub fn settle_many_through_reactor(reactor: &Reactor, count: usize) -> (Vec<Promise<usize>>, ProcessReport) {
    let promises: Vec<Promise<usize>> = (0..count).map(|_| Promise::new()).collect();

    std::thread::scope(|scope| {
        for (i, promise) in promises.iter().enumerate() {
            let callback = convert_promise_on(reactor, promise);
            scope.spawn(move || callback.success(i));
        }
    });

    let report = reactor.process();
    (promises, report)
}
