// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use color_eyre::Result;
use testreport::TestReportApp;

fn main() -> Result<()> {
    color_eyre::install()?;

    let opts = TestReportApp::parse();
    let output = opts.init_output();

    let mut stdout = std::io::stdout().lock();
    match opts.exec(output, &mut stdout) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            error.display_to_stderr(&output.stderr_styles());
            std::process::exit(error.process_exit_code())
        }
    }
}
