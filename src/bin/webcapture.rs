use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use webcapture::args::{self, Capture, Invocation};
use webcapture::report::CaptureReport;
use webcapture::{OutputKind, WebCaptureError, capture, output};

fn main() -> ExitCode {
    let invocation = match args::parse(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{}", e);
            if e.wants_usage() {
                eprintln!();
                eprintln!("{}", args::usage());
            }
            return ExitCode::FAILURE;
        }
    };

    let job = match invocation {
        Invocation::Help => {
            println!("{}", args::usage());
            return ExitCode::SUCCESS;
        }
        Invocation::Version => {
            print!("{}", args::version());
            return ExitCode::SUCCESS;
        }
        Invocation::Capture(job) => job,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(job.log_directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&job) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(job: &Capture) -> Result<(), WebCaptureError> {
    let Capture {
        request,
        settings,
        json_report,
        ..
    } = job;

    let artifact = capture::run(request, settings)?;
    output::write_artifact(&artifact, &request.path)?;

    if *json_report {
        println!("{}", CaptureReport::new(request, &artifact)?.to_json()?);
    } else {
        match artifact.kind {
            OutputKind::Pdf => println!("PDF generated successfully: {}", request.path.display()),
            OutputKind::Image => {
                println!("Screenshot captured successfully: {}", request.path.display())
            }
        }
    }
    Ok(())
}
