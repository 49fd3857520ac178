use anyhow::{Context, Result};
use bbox::prelude::*;
use clap::Parser;
use log::info;
use prettytable::{cell, row, Table};
use rand::{prelude::*, rngs::StdRng};
use rpn_loader::{Etl, LocalizationEtl, OutputBuffers, ParamFactory, ProviderConfig};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Debug, Clone, Parser)]
/// Inspect region proposal targets produced from annotations.
enum Opts {
    /// Print the output buffer shapes.
    Shapes {
        /// configuration file
        config_file: PathBuf,
    },
    /// Run one annotation through the pipeline and summarize the targets.
    Inspect {
        /// configuration file
        config_file: PathBuf,
        /// annotation JSON file
        annotation_file: PathBuf,
        /// random seed
        #[clap(long)]
        seed: Option<u64>,
        /// force horizontal flip
        #[clap(long)]
        flip: bool,
        /// disable random choices
        #[clap(long)]
        deterministic: bool,
    },
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    match Opts::parse() {
        Opts::Shapes { config_file } => shapes(config_file)?,
        Opts::Inspect {
            config_file,
            annotation_file,
            seed,
            flip,
            deterministic,
        } => inspect(config_file, annotation_file, seed, flip, deterministic)?,
    }

    Ok(())
}

fn shapes(config_file: impl AsRef<Path>) -> Result<()> {
    let config = ProviderConfig::open(config_file)?.build()?;

    let mut table = Table::new();
    table.add_row(row!["name", "dims", "kind", "elements", "bytes"]);
    config.output_shapes().iter().for_each(|shape| {
        table.add_row(row![
            shape.name,
            format!("{:?}", shape.dims),
            shape.kind,
            shape.element_count(),
            shape.byte_size()
        ]);
    });
    table.printstd();

    Ok(())
}

fn inspect(
    config_file: impl AsRef<Path>,
    annotation_file: impl AsRef<Path>,
    seed: Option<u64>,
    flip: bool,
    deterministic: bool,
) -> Result<()> {
    let mut config = ProviderConfig::open(config_file)?;
    config.image.debug_deterministic |= deterministic;
    let factory = ParamFactory::new(config.image.clone())?;
    let config = Arc::new(config.build()?);
    let etl = LocalizationEtl::new(config.clone());

    let annotation_file = annotation_file.as_ref();
    let data = std::fs::read(annotation_file)
        .with_context(|| format!("unable to read '{}'", annotation_file.display()))?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let decoded = etl.extract(&data)?;
    let mut params = factory.make_params(decoded.size, &mut rng)?;
    params.flip |= flip;
    info!("image params {:?}", params);

    let transformed = etl.transform(&params, &decoded)?;
    let mut buffers = OutputBuffers::new(&config);
    etl.load(&transformed, &mut buffers);

    let assignment = &transformed.assignment;

    // summary
    {
        let mut table = Table::new();
        table.add_row(row!["item", "value"]);
        table.add_row(row!["source size", format!("{}x{}", decoded.size.w(), decoded.size.h())]);
        table.add_row(row![
            "output size",
            format!("{}x{}", transformed.image_size.w(), transformed.image_size.h())
        ]);
        table.add_row(row!["scale", transformed.image_scale]);
        table.add_row(row!["flip", params.flip]);
        table.add_row(row![
            "feature grid",
            format!("{}x{}", config.feature_size().w(), config.feature_size().h())
        ]);
        table.add_row(row!["anchors per cell", config.anchors().num_base_anchors()]);
        table.add_row(row!["anchors", assignment.num_anchors()]);
        table.add_row(row!["foreground", assignment.num_foreground()]);
        table.add_row(row!["background", assignment.num_background()]);
        table.add_row(row!["ground truth", buffers.num_gt_boxes[0]]);
        table.printstd();
    }

    // ground truth
    {
        let mut table = Table::new();
        table.add_row(row!["index", "class", "xmin", "ymin", "xmax", "ymax", "difficult", "anchors"]);
        transformed
            .gt_boxes
            .iter()
            .enumerate()
            .for_each(|(index, label)| {
                let class_name = config
                    .class_names()
                    .get_index(label.class)
                    .map(|name| name.as_str())
                    .unwrap_or("?");
                let num_anchors = assignment
                    .matched_gt()
                    .iter()
                    .filter(|&&gt_index| gt_index == index)
                    .count();
                let [xmin, ymin, xmax, ymax] = label.rect.xyxy();

                table.add_row(row![
                    index,
                    class_name,
                    xmin,
                    ymin,
                    xmax,
                    ymax,
                    label.difficult,
                    num_anchors
                ]);
            });
        table.printstd();
    }

    Ok(())
}
