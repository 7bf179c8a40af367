//! End-to-end demo: capture, bootstrap, crop, verify.
//!
//! ```text
//! photoproof_demo [--seed N] [--crop x0,y0,x1,y1]...
//! ```
//!
//! Each `--crop` is applied in order to the previous result. Without any
//! `--crop` a single `3,3,6,6` crop is applied. `RUST_LOG` controls the
//! filter (default `photoproof=info`); `PHOTOPROOF_LOG_JSON=1` switches to
//! JSON lines.

#![forbid(unsafe_code)]

use std::env;

use anyhow::{bail, Context, Result};
use photoproof::{edit_crop, verify_detailed, PcdConfig, Proof, SecureCamera};
use tracing::info;

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

fn parse_all(args: &[String], key: &str) -> Vec<String> {
    args.windows(2).filter(|w| w[0] == key).map(|w| w[1].clone()).collect()
}

fn parse_bool(s: &str) -> bool {
    matches!(s, "1" | "true" | "True" | "TRUE" | "yes" | "y")
}

fn parse_rect(s: &str) -> Result<(i64, i64, i64, i64)> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<i64>().with_context(|| format!("bad crop bound {p:?}")))
        .collect::<Result<Vec<_>>>()?;
    match parts.as_slice() {
        [x0, y0, x1, y1] => Ok((*x0, *y0, *x1, *y1)),
        _ => bail!("--crop expects x0,y0,x1,y1, got {s:?}"),
    }
}

fn init_tracing() {
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| "photoproof=info,photoproof_demo=info".into());
    let json = env::var("PHOTOPROOF_LOG_JSON").map(|v| parse_bool(&v)).unwrap_or(false);
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn report(label: &str, camera: &SecureCamera, proof: &Proof) {
    match verify_detailed(camera.verifying_keys(), proof) {
        Ok(()) => println!("SUCCESS: {label} verified"),
        Err(failure) => println!("FAIL: {label} rejected ({failure})"),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().collect();

    let mut builder = PcdConfig::builder();
    if let Some(seed) = parse_flag(&args, "--seed") {
        builder = builder.seed(seed.parse().context("--seed expects an integer")?);
    }
    let config = builder.build();

    let mut rects = parse_all(&args, "--crop")
        .iter()
        .map(|s| parse_rect(s))
        .collect::<Result<Vec<_>>>()?;
    if rects.is_empty() {
        rects.push((3, 3, 6, 6));
    }

    info!("running generator (this takes a while)");
    let camera = SecureCamera::new(config).context("camera setup")?;
    let mut rng = config.rng();

    let unproven = camera.capture(SecureCamera::take_picture())?;
    report("signed capture", &camera, &unproven);

    let mut proof = camera.capture_proven(SecureCamera::take_picture(), &mut rng)?;
    report("identity proof", &camera, &proof);

    for (i, rect) in rects.into_iter().enumerate() {
        proof = edit_crop(camera.proving_keys(), config, &proof, rect, &mut rng)
            .with_context(|| format!("crop step {}", i + 1))?;
        let (w, h) = proof.image().extent();
        report(&format!("crop step {} ({w}x{h})", i + 1), &camera, &proof);
    }
    Ok(())
}
