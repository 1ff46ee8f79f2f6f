// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for z80pp.

fn main() {
    match z80pp::driver::run() {
        Ok(report) => {
            for diag in report.diagnostics() {
                eprintln!("{diag}");
            }
            if report.has_errors() {
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
