//! The non-graphical summary of a completed run: per-process timelines and
//! turnaround/waiting/response times, plus aggregate and memory counters.

use crate::process::{Interval, Process};

#[derive(Debug, Clone)]
pub struct ProcessSummary {
    pub pid: String,
    pub cpu_intervals: Vec<Interval>,
    pub io_intervals: Vec<Interval>,
    pub turnaround: Option<u64>,
    pub waiting: Option<u64>,
    pub response: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub processes: Vec<ProcessSummary>,
    pub avg_turnaround: f64,
    pub avg_waiting: f64,
    pub avg_response: f64,
    pub total_cpu_time: u64,
    pub total_idle_time: u64,
    pub context_switches: u64,
    pub page_faults: u64,
    pub replacements: u64,
    pub free_frames: usize,
}

impl Report {
    pub fn build(
        processes: &[Process],
        total_cpu_time: u64,
        total_idle_time: u64,
        context_switches: u64,
        page_faults: u64,
        replacements: u64,
        free_frames: usize,
    ) -> Self {
        let summaries: Vec<ProcessSummary> = processes
            .iter()
            .map(|p| ProcessSummary {
                pid: p.pid.clone(),
                cpu_intervals: p.cpu_intervals().to_vec(),
                io_intervals: p.io_intervals().to_vec(),
                turnaround: p.turnaround_time(),
                waiting: p.waiting_time(),
                response: p.response_time(),
            })
            .collect();

        let count = summaries.len().max(1) as f64;
        let avg_turnaround =
            summaries.iter().filter_map(|s| s.turnaround).sum::<u64>() as f64 / count;
        let avg_waiting = summaries.iter().filter_map(|s| s.waiting).sum::<u64>() as f64 / count;
        let avg_response =
            summaries.iter().filter_map(|s| s.response).sum::<u64>() as f64 / count;

        Self {
            processes: summaries,
            avg_turnaround,
            avg_waiting,
            avg_response,
            total_cpu_time,
            total_idle_time,
            context_switches,
            page_faults,
            replacements,
            free_frames,
        }
    }

    /// Renders a human-readable text summary (the non-graphical analogue of
    /// the GUI's Gantt chart).
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("pid  cpu intervals                 io intervals\n");
        for p in &self.processes {
            let cpu: Vec<String> = p
                .cpu_intervals
                .iter()
                .map(|iv| format!("[{},{})", iv.start, iv.end))
                .collect();
            let io: Vec<String> = p
                .io_intervals
                .iter()
                .map(|iv| format!("[{},{})", iv.start, iv.end))
                .collect();
            out.push_str(&format!("{:<4} {:<28} {}\n", p.pid, cpu.join(" "), io.join(" ")));
        }
        out.push_str(&format!(
            "\navg turnaround={:.2} avg waiting={:.2} avg response={:.2}\n",
            self.avg_turnaround, self.avg_waiting, self.avg_response
        ));
        out.push_str(&format!(
            "total_cpu_time={} total_idle_time={} context_switches={}\n",
            self.total_cpu_time, self.total_idle_time, self.context_switches
        ));
        out.push_str(&format!(
            "page_faults={} replacements={} free_frames={}\n",
            self.page_faults, self.replacements, self.free_frames
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Burst;

    #[test]
    fn averages_over_completed_processes() {
        let mut p = Process::new("P1".into(), 0, vec![Burst::Cpu(3)], 1, 1);
        p.end_time = Some(2);
        p.start_time = Some(0);
        let report = Report::build(&[p], 3, 0, 1, 1, 0, 1);
        assert_eq!(report.avg_turnaround, 3.0);
        assert_eq!(report.avg_waiting, 0.0);
    }
}
