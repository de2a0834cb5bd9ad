//! Running-job limit behaviour across many jobs of one account.

mod common;

use common::{account, engine, found};
use mf_priority::core::{
    DependOutcome, JobArgs, JobAux, JobLifecycle, Lookup, PriorityOutcome, DEPENDENCY_LABEL,
};

#[test]
fn test_fifo_release_with_single_slot() {
    let (engine, host) = engine();
    engine.ingest_accounts(&[account(9, "a", 0.5, 1)]);

    let jobs: Vec<JobArgs> = (1..=4).map(|id| JobArgs::new(id, 9).with_bank("a")).collect();
    let mut auxes: Vec<JobAux> = jobs.iter().map(|_| JobAux::new()).collect();
    for (job, aux) in jobs.iter().zip(auxes.iter_mut()) {
        engine.new_job(job, aux).unwrap();
    }

    assert_eq!(engine.depend(&jobs[0], &mut auxes[0]).unwrap(), DependOutcome::Proceed);
    for i in 1..4 {
        assert_eq!(engine.depend(&jobs[i], &mut auxes[i]).unwrap(), DependOutcome::Held);
    }
    assert_eq!(
        found(&engine, 9, "a").lock().snapshot().held_jobs,
        vec![2, 3, 4]
    );

    for i in 0..4 {
        engine.run(&jobs[i], &mut auxes[i]).unwrap();
        let done = jobs[i].clone().allocated();
        engine.inactive(&done, &mut auxes[i]).unwrap();
    }

    assert_eq!(host.released_jobs(), vec![2, 3, 4]);
    let account = found(&engine, 9, "a");
    let account = account.lock();
    assert_eq!(account.cur_run_jobs, 0);
    assert_eq!(account.cur_active_jobs, 0);
    assert_eq!(account.gate.reserved(), 0);
}

#[test]
fn test_admitted_jobs_count_against_the_cap_before_running() {
    let (engine, _host) = engine();
    engine.ingest_accounts(&[account(9, "a", 0.5, 2)]);

    let mut jobs = Vec::new();
    let mut held = 0;
    for id in 1..=5 {
        let job = JobArgs::new(id, 9).with_bank("a");
        let mut aux = JobAux::new();
        engine.new_job(&job, &mut aux).unwrap();
        let outcome = engine.depend(&job, &mut aux).unwrap();
        if outcome == DependOutcome::Held {
            held += 1;
        }
        jobs.push((job, aux));
    }
    assert_eq!(held, 3);

    let account = found(&engine, 9, "a");
    let account = account.lock();
    assert_eq!(account.snapshot().held_jobs, vec![3, 4, 5]);
    assert_eq!(account.gate.occupied(account.cur_run_jobs), 2);
}

#[test]
fn test_cancelled_held_job_leaves_fifo() {
    let (engine, host) = engine();
    engine.ingest_accounts(&[account(9, "a", 0.5, 1)]);

    let mut jobs: Vec<(JobArgs, JobAux)> = (1..=3)
        .map(|id| (JobArgs::new(id, 9).with_bank("a"), JobAux::new()))
        .collect();
    for (job, aux) in &mut jobs {
        engine.new_job(job, aux).unwrap();
        engine.depend(job, aux).unwrap();
    }

    // Job 2 is cancelled while held.
    let (job, aux) = &mut jobs[1];
    engine.inactive(job, aux).unwrap();
    assert!(!found(&engine, 9, "a").lock().gate.is_held(2));
    assert!(host.released_jobs().is_empty());

    let (job, aux) = &mut jobs[0];
    engine.run(job, aux).unwrap();
    engine.inactive(&job.clone().allocated(), aux).unwrap();
    assert_eq!(host.released_jobs(), vec![3]);
    assert!(!host.has_dependency(3, DEPENDENCY_LABEL));
}

#[test]
fn test_admitted_job_cancelled_before_running_frees_its_slot() {
    let (engine, host) = engine();
    engine.ingest_accounts(&[account(9, "a", 0.5, 1)]);

    let first = JobArgs::new(1, 9).with_bank("a");
    let mut first_aux = JobAux::new();
    engine.new_job(&first, &mut first_aux).unwrap();
    assert_eq!(engine.depend(&first, &mut first_aux).unwrap(), DependOutcome::Proceed);

    let second = JobArgs::new(2, 9).with_bank("a");
    let mut second_aux = JobAux::new();
    engine.new_job(&second, &mut second_aux).unwrap();
    assert_eq!(engine.depend(&second, &mut second_aux).unwrap(), DependOutcome::Held);

    engine.inactive(&first, &mut first_aux).unwrap();
    assert_eq!(host.released_jobs(), vec![2]);
}

#[test]
fn test_raising_the_cap_applies_to_later_releases() {
    let (engine, host) = engine();
    engine.ingest_accounts(&[account(9, "a", 0.5, 1)]);

    let mut jobs: Vec<(JobArgs, JobAux)> = (1..=3)
        .map(|id| (JobArgs::new(id, 9).with_bank("a"), JobAux::new()))
        .collect();
    for (job, aux) in &mut jobs {
        engine.new_job(job, aux).unwrap();
        engine.depend(job, aux).unwrap();
    }
    let (job, aux) = &mut jobs[0];
    engine.run(job, aux).unwrap();

    engine.ingest_accounts(&[account(9, "a", 0.5, 3)]);
    let account = found(&engine, 9, "a");
    assert_eq!(account.lock().cur_run_jobs, 1);
    assert_eq!(account.lock().gate.held_len(), 2);

    let (job, aux) = &mut jobs[0];
    engine.inactive(&job.clone().allocated(), aux).unwrap();
    assert_eq!(host.released_jobs(), vec![2]);
}

#[test]
fn test_placeholder_jobs_rebound_at_priority_respect_the_cap() {
    let (engine, host) = engine();

    let mut jobs: Vec<(JobArgs, JobAux)> = (1..=3)
        .map(|id| (JobArgs::new(id, 42), JobAux::new()))
        .collect();
    for (job, aux) in &mut jobs {
        engine.validate(job).unwrap();
        engine.new_job(job, aux).unwrap();
        assert_eq!(engine.depend(job, aux).unwrap(), DependOutcome::Proceed);
        assert_eq!(engine.priority(job, aux).unwrap(), PriorityOutcome::Unavailable);
    }
    let Lookup::Placeholder(placeholder) = engine.store().lookup(42, Some("unknown")) else {
        panic!("placeholder missing");
    };

    engine.ingest_accounts(&[account(42, "x", 0.5, 1)]);
    let real = found(&engine, 42, "x");
    for (job, aux) in &mut jobs {
        assert_eq!(engine.priority(job, aux).unwrap(), PriorityOutcome::Value(50_000));
        let binding = aux.binding.as_ref().unwrap();
        assert!(binding.is_bound_to(&real));
        assert!(!binding.is_bound_to(&placeholder));
    }

    assert_eq!(real.lock().snapshot().held_jobs, vec![2, 3]);
    assert!(host.has_dependency(2, DEPENDENCY_LABEL));
    assert!(host.has_dependency(3, DEPENDENCY_LABEL));
    assert!(!host.has_dependency(1, DEPENDENCY_LABEL));
    assert!(jobs[1].1.contains_dep(DEPENDENCY_LABEL));

    let (job, aux) = &mut jobs[0];
    engine.run(job, aux).unwrap();
    assert_eq!(real.lock().cur_run_jobs, 1);
    engine.inactive(&job.clone().allocated(), aux).unwrap();
    assert_eq!(host.released_jobs(), vec![2]);

    let (job, aux) = &mut jobs[1];
    engine.run(job, aux).unwrap();
    let account = real.lock();
    assert_eq!(account.cur_run_jobs, 1);
    assert!(account.gate.occupied(account.cur_run_jobs) <= 1);
    assert_eq!(account.cur_active_jobs, 2);
}
