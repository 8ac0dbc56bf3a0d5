//! Integration tests for the Mihiraki crate.
//!
//! These tests run the full analyze, plan and transform pipeline on synthetic books
//! and validate the written pages together with the page and spread maps.

use image::Rgb;
use mihiraki::error::{Error, Result};
use mihiraki::prelude::*;
use tokio::time::timeout;

mod common;
use common::{
    LONG_TEST_TIMEOUT, PAGE_HEIGHT, PAGE_WIDTH, cleanup_test_dirs, flat_page, setup_test_dirs,
    striped_page, write_book,
};

/// Cover, a two-page spread, and a closing page.
async fn write_spread_book(dir: &Path) -> Result<Vec<PathBuf>> {
    write_book(
        dir,
        vec![
            flat_page(PAGE_WIDTH, PAGE_HEIGHT, Rgb([255, 255, 255])),
            striped_page(PAGE_WIDTH, PAGE_HEIGHT),
            striped_page(PAGE_WIDTH, PAGE_HEIGHT),
            flat_page(PAGE_WIDTH, PAGE_HEIGHT, Rgb([255, 255, 255])),
        ],
    )
    .await
}

fn output_names(comic: &ProcessedComic) -> Vec<String> {
    comic
        .images
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[tokio::test]
async fn test_full_pipeline_merges_and_splits_spread() -> Result<()> {
    let dirs = setup_test_dirs("full_pipeline_spread").await;
    let pages = write_spread_book(&dirs.source_dir).await?;

    let config = ProcessorConfig::builder()
        .reading_direction(Direction::Ltr)
        .split_mode(SplitMode::Both)
        .target_size(TargetSize::new(30, 40))
        .worker_threads(2usize)
        .build()?;

    let comic = timeout(
        LONG_TEST_TIMEOUT,
        config.process(pages, dirs.target_dir.clone()),
    )
    .await
    .expect("Test timed out")?;

    assert_eq!(
        output_names(&comic),
        vec![
            "00000.jpg",
            "00001.jpg",
            "00002.jpg",
            "00003.jpg",
            "00004.jpg"
        ]
    );
    for image in &comic.images {
        assert!(image.exists());
        let decoded = image::open(image)?;
        assert_eq!((decoded.width(), decoded.height()), (30, 40));
    }

    assert_eq!(comic.page_map.entries(), &[(0, 0), (1, 2), (2, 2), (3, 4)]);
    assert_eq!(
        comic.spread_map.iter().collect::<Vec<_>>(),
        vec![
            (1, SpreadSide::Center),
            (2, SpreadSide::Left),
            (3, SpreadSide::Right)
        ]
    );

    cleanup_test_dirs(&dirs).await;
    Ok(())
}

#[tokio::test]
async fn test_rtl_split_only_flags() -> Result<()> {
    let dirs = setup_test_dirs("rtl_split").await;
    let pages = write_spread_book(&dirs.source_dir).await?;

    let config = ProcessorConfig::builder()
        .reading_direction(Direction::Rtl)
        .split_mode(SplitMode::Split)
        .build()?;

    let comic = timeout(
        LONG_TEST_TIMEOUT,
        config.process(pages, dirs.target_dir.clone()),
    )
    .await
    .expect("Test timed out")?;

    assert_eq!(comic.images.len(), 4);
    assert_eq!(comic.page_map.entries(), &[(0, 0), (1, 1), (2, 1), (3, 3)]);
    assert_eq!(comic.spread_map.get(1), Some(SpreadSide::Right));
    assert_eq!(comic.spread_map.get(2), Some(SpreadSide::Left));
    assert!(!comic.spread_map.contains(3));

    // Without a target canvas, halves keep the cropped size.
    let half = image::open(&comic.images[1])?;
    assert_eq!((half.width(), half.height()), (PAGE_WIDTH, PAGE_HEIGHT));

    cleanup_test_dirs(&dirs).await;
    Ok(())
}

#[tokio::test]
async fn test_merge_disabled_keeps_page_count() -> Result<()> {
    let dirs = setup_test_dirs("merge_disabled").await;
    let pages = write_spread_book(&dirs.source_dir).await?;

    let config = ProcessorConfig::builder()
        .merge_enabled(false)
        .split_mode(SplitMode::None)
        .crop_mode(CropMode::None)
        .build()?;

    let comic = config.process_blocking(&pages, &dirs.target_dir)?;
    assert_eq!(comic.images.len(), pages.len());
    assert!(comic.page_map.is_identity());
    assert!(comic.spread_map.is_empty());

    for image in &comic.images {
        let decoded = image::open(image)?.to_luma8();
        assert_eq!(decoded.dimensions(), (PAGE_WIDTH, PAGE_HEIGHT));
    }

    cleanup_test_dirs(&dirs).await;
    Ok(())
}

#[tokio::test]
async fn test_landscape_page_is_a_spread_on_its_own() -> Result<()> {
    let dirs = setup_test_dirs("landscape_page").await;
    let pages = write_book(
        &dirs.source_dir,
        vec![
            flat_page(PAGE_WIDTH, PAGE_HEIGHT, Rgb([255, 255, 255])),
            striped_page(PAGE_HEIGHT * 2, PAGE_HEIGHT),
        ],
    )
    .await?;

    let config = ProcessorConfig::builder()
        .split_mode(SplitMode::Rotate)
        .build()?;
    let comic = config.process(pages, dirs.target_dir.clone()).await?;

    assert_eq!(comic.images.len(), 2);
    assert_eq!(comic.spread_map.get(1), Some(SpreadSide::Center));
    let rotated = image::open(&comic.images[1])?;
    assert_eq!((rotated.width(), rotated.height()), (PAGE_HEIGHT, PAGE_HEIGHT * 2));

    cleanup_test_dirs(&dirs).await;
    Ok(())
}

#[tokio::test]
async fn test_process_directory_collects_pages() -> Result<()> {
    let dirs = setup_test_dirs("process_directory").await;
    write_spread_book(&dirs.source_dir).await?;

    let config = ProcessorConfig::builder()
        .split_mode(SplitMode::Split)
        .build()?;
    let comic = timeout(
        LONG_TEST_TIMEOUT,
        config.process_directory(&dirs.source_dir, &dirs.target_dir),
    )
    .await
    .expect("Test timed out")?;

    assert_eq!(comic.images.len(), 4);
    assert_eq!(comic.page_map.relocate(3), Some(3));
    assert_eq!(
        comic
            .spread_map
            .resolve_page_sides(comic.images.len(), Direction::Ltr)
            .iter()
            .map(SpreadSide::as_property)
            .collect::<Vec<_>>(),
        vec!["center", "left", "right", "left"]
    );

    cleanup_test_dirs(&dirs).await;
    Ok(())
}

#[tokio::test]
async fn test_undecodable_page_fails_the_run() -> Result<()> {
    let dirs = setup_test_dirs("undecodable_page").await;
    let mut pages = write_spread_book(&dirs.source_dir).await?;

    let broken = dirs.source_dir.join("004.png");
    tokio::fs::write(&broken, b"not a png").await?;
    pages.push(broken);

    let config = ProcessorConfig::default();
    let result = config.process(pages, dirs.target_dir.clone()).await;
    assert!(matches!(result, Err(Error::Image(_))));

    cleanup_test_dirs(&dirs).await;
    Ok(())
}

#[tokio::test]
async fn test_empty_page_list_is_rejected() -> Result<()> {
    let dirs = setup_test_dirs("empty_pages").await;

    let config = ProcessorConfig::default();
    let result = config.process(Vec::new(), dirs.target_dir.clone()).await;
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
    assert!(!dirs.target_dir.exists());

    cleanup_test_dirs(&dirs).await;
    Ok(())
}
