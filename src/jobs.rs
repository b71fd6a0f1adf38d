use crate::error::{Result, SmashError};
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: usize,
    pub pid: Pid,
    pub command: String,
}

/// Fixed-capacity job registry. Slot `i` holds the job with id `i`; slot 0
/// is never used, so ids run from 1 to the capacity.
pub struct JobTable {
    slots: Vec<Option<Job>>,
}

impl JobTable {
    pub fn new(capacity: usize) -> Self {
        JobTable {
            slots: vec![None; capacity + 1],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Lowest free id, if any slot is left.
    pub fn next_free_id(&self) -> Option<usize> {
        (1..self.slots.len()).find(|&id| self.slots[id].is_none())
    }

    pub fn add_job(&mut self, command: &str, pid: Pid) -> Result<usize> {
        if command.is_empty() {
            return Err(SmashError::EmptyJobText);
        }
        let id = self
            .next_free_id()
            .ok_or(SmashError::JobTableFull(self.capacity()))?;

        self.slots[id] = Some(Job {
            id,
            pid,
            command: command.to_string(),
        });
        debug!("registered job [{}] pid {} ({})", id, pid, command);
        Ok(id)
    }

    pub fn get_job_by_id(&self, id: usize) -> Option<&Job> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    pub fn get_job_by_pid(&self, pid: Pid) -> Option<&Job> {
        if pid.as_raw() <= 0 {
            return None;
        }
        self.iter().find(|job| job.pid == pid)
    }

    pub fn remove_job_by_id(&mut self, id: usize) -> Option<Job> {
        let removed = self.slots.get_mut(id).and_then(Option::take);
        if let Some(job) = &removed {
            debug!("removed job [{}] pid {}", job.id, job.pid);
        }
        removed
    }

    pub fn remove_job_by_pid(&mut self, pid: Pid) -> Option<Job> {
        let id = self.get_job_by_pid(pid)?.id;
        self.remove_job_by_id(id)
    }

    /// Live jobs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Collects every child that has already terminated and drops its
    /// entry. Never blocks.
    pub fn reap_finished(&mut self) {
        loop {
            match waitpid(None, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => break,
                Ok(status) => {
                    if let Some(pid) = status.pid() {
                        debug!("reaped pid {} ({:?})", pid, status);
                        self.remove_job_by_pid(pid);
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => break,
                Err(e) => {
                    warn!("waitpid during reap failed: {}", e);
                    break;
                }
            }
        }
    }

    pub fn print_all(&self) {
        for job in self.iter() {
            println!("[{}] {}", job.id, job.command);
        }
    }

    /// SIGKILLs every live job. Entries stay until they are reaped.
    pub fn kill_all(&self) {
        println!("smash: sending SIGKILL signal to {} jobs:", self.len());
        for job in self.iter() {
            if let Err(e) = signal::kill(job.pid, Signal::SIGKILL) {
                warn!("failed to kill pid {}: {}", job.pid, e);
            }
            println!("{}: {}", job.pid, job.command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(raw: i32) -> Pid {
        Pid::from_raw(raw)
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut jobs = JobTable::new(10);
        assert_eq!(jobs.add_job("sleep 1", pid(1001)).unwrap(), 1);
        assert_eq!(jobs.add_job("sleep 2", pid(1002)).unwrap(), 2);
        assert_eq!(jobs.add_job("sleep 3", pid(1003)).unwrap(), 3);
        assert_eq!(jobs.len(), 3);
    }

    #[test]
    fn test_lowest_free_id_is_reused() {
        let mut jobs = JobTable::new(10);
        for n in 0..4 {
            jobs.add_job("sleep", pid(2000 + n)).unwrap();
        }
        jobs.remove_job_by_id(3);
        jobs.remove_job_by_id(2);
        assert_eq!(jobs.add_job("again", pid(2100)).unwrap(), 2);
        assert_eq!(jobs.add_job("again", pid(2101)).unwrap(), 3);
        assert_eq!(jobs.add_job("again", pid(2102)).unwrap(), 5);
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let mut jobs = JobTable::new(4);
        assert!(matches!(
            jobs.add_job("", pid(3000)),
            Err(SmashError::EmptyJobText)
        ));
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_full_table() {
        let mut jobs = JobTable::new(2);
        jobs.add_job("a", pid(4000)).unwrap();
        jobs.add_job("b", pid(4001)).unwrap();
        assert_eq!(jobs.next_free_id(), None);
        assert!(matches!(
            jobs.add_job("c", pid(4002)),
            Err(SmashError::JobTableFull(2))
        ));
        jobs.remove_job_by_pid(pid(4000));
        assert_eq!(jobs.add_job("c", pid(4002)).unwrap(), 1);
    }

    #[test]
    fn test_lookup() {
        let mut jobs = JobTable::new(4);
        jobs.add_job("sleep 10", pid(5000)).unwrap();

        assert_eq!(jobs.get_job_by_id(1).map(|j| j.pid), Some(pid(5000)));
        assert_eq!(jobs.get_job_by_pid(pid(5000)).map(|j| j.id), Some(1));
        assert!(jobs.get_job_by_id(0).is_none());
        assert!(jobs.get_job_by_id(2).is_none());
        assert!(jobs.get_job_by_id(99).is_none());
        assert!(jobs.get_job_by_pid(pid(0)).is_none());
        assert!(jobs.get_job_by_pid(pid(-1)).is_none());
        assert!(jobs.get_job_by_pid(pid(5001)).is_none());
    }

    #[test]
    fn test_removal_is_idempotent() {
        let mut jobs = JobTable::new(4);
        jobs.add_job("sleep 10", pid(6000)).unwrap();
        assert!(jobs.remove_job_by_pid(pid(6000)).is_some());
        assert!(jobs.remove_job_by_pid(pid(6000)).is_none());
        assert!(jobs.remove_job_by_id(1).is_none());
        assert!(jobs.remove_job_by_id(42).is_none());
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_iteration_is_ordered_by_id() {
        let mut jobs = JobTable::new(8);
        for n in 0..5 {
            jobs.add_job(&format!("job {}", n), pid(7000 + n)).unwrap();
        }
        jobs.remove_job_by_id(1);
        jobs.remove_job_by_id(4);
        jobs.add_job("late", pid(7100)).unwrap();

        let ids: Vec<usize> = jobs.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 5]);
        assert_eq!(jobs.get_job_by_id(1).unwrap().command, "late");
    }
}
