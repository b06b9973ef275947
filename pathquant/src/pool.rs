//! Worker pool
//!
//! A fixed number of worker tasks (threads) take jobs from a shared channel and send back
//! the results.  Jobs are fed into the channel by a separate task so that the calling
//! thread is free to collect results as they arrive.  Results are returned in completion
//! order, not submission order.
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};

fn worker<J, R, F>(ix: usize, recv: Receiver<J>, snd: Sender<R>, f: &F) -> anyhow::Result<()>
where
    F: Fn(J) -> R,
{
    debug!("Worker task {} starting up", ix);
    let mut n = 0;
    while let Ok(job) = recv.recv() {
        snd.send(f(job))
            .map_err(|_| anyhow!("Worker task {}: result channel closed", ix))?;
        n += 1;
    }
    debug!("Worker task {} closing down after {} jobs", ix, n);
    Ok(())
}

/// Run f on each job using nt worker threads.
pub fn run_pool<J, R, F>(nt: usize, jobs: Vec<J>, f: F) -> anyhow::Result<Vec<R>>
where
    J: Send,
    R: Send,
    F: Fn(J) -> R + Sync,
{
    let n_jobs = jobs.len();
    if n_jobs == 0 {
        return Ok(Vec::new());
    }
    let nt = nt.clamp(1, n_jobs);
    trace!("Running {} jobs with {} worker tasks", n_jobs, nt);

    thread::scope(|sc| {
        let (send_job, recv_job) = bounded(nt * 2);
        let (send_res, recv_res) = bounded(nt * 2);
        let f = &f;

        let join_handles: Vec<_> = (0..nt)
            .map(|ix| {
                let r = recv_job.clone();
                let s = send_res.clone();
                sc.spawn(move || worker(ix + 1, r, s, f))
            })
            .collect();
        // Only the workers should hold these now
        drop(recv_job);
        drop(send_res);

        sc.spawn(move || {
            for j in jobs {
                if send_job.send(j).is_err() {
                    break;
                }
            }
        });

        let results: Vec<R> = recv_res.iter().collect();

        for jh in join_handles {
            jh.join()
                .map_err(|_| anyhow!("Worker task panicked"))??;
        }
        if results.len() != n_jobs {
            Err(anyhow!(
                "Worker pool returned {} results for {} jobs",
                results.len(),
                n_jobs
            ))
        } else {
            Ok(results)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_jobs_processed() {
        let jobs: Vec<usize> = (0..100).collect();
        let mut res = run_pool(4, jobs, |x| x * 2).unwrap();
        res.sort_unstable();
        let expected: Vec<usize> = (0..100).map(|x| x * 2).collect();
        assert_eq!(res, expected);
    }

    #[test]
    fn more_threads_than_jobs() {
        let res = run_pool(16, vec!["a".to_string()], |s| s.len()).unwrap();
        assert_eq!(res, vec![1]);
        let res: Vec<usize> = run_pool(4, Vec::<String>::new(), |s| s.len()).unwrap();
        assert!(res.is_empty());
    }
}
