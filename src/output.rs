//! Human-readable output for plans and jobs

use crate::job::Job;
use crate::query::Plan;
use std::io;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print a job tree to stdout
pub fn print_job_tree(job: &Job, color: bool) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(color));
    write_job_tree(&mut stdout, job)
}

/// Print the Basic queries of a plan to stdout, one per line
pub fn print_plan(plan: &Plan, color: bool) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(color));
    write_plan(&mut stdout, plan)
}

fn color_choice(color: bool) -> ColorChoice {
    if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

pub fn write_job_tree<W: WriteColor>(out: &mut W, job: &Job) -> io::Result<()> {
    write_job(out, job, 0)
}

fn write_job<W: WriteColor>(out: &mut W, job: &Job, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    write!(out, "{}", indent)?;

    out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
    write!(out, "{}", job.name())?;
    out.reset()?;

    match job {
        Job::Basic(basic) => {
            write!(out, " ")?;
            out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(out, "{}", basic.query)?;
            out.reset()?;

            out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
            writeln!(out, " (limit {}, timeout {}s)", basic.limit, basic.timeout_secs)?;
            out.reset()?;
        }
        Job::Sequential(seq) => {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
            if seq.run_past_first_success {
                writeln!(out, " (run all)")?;
            } else {
                writeln!(out, " (stop at first success)")?;
            }
            out.reset()?;

            for child in &seq.children {
                write_job(out, child, depth + 1)?;
            }
        }
    }

    Ok(())
}

pub fn write_plan<W: WriteColor>(out: &mut W, plan: &Plan) -> io::Result<()> {
    for (i, basic) in plan.iter().enumerate() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        write!(out, "{}:", i + 1)?;
        out.reset()?;
        writeln!(out, " {}", basic)?;
    }
    Ok(())
}
