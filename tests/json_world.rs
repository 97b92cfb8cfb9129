use chunk_provider::world::chunk::chunk_position;
use chunk_provider::world::{ChunkGenerator, WorldChunk, JsonFileChunkLoader, PerlinChunkGenerator, WorldInfo};
use chunk_provider::{ChunkProvider, ProviderConfig};

fn start(root: &std::path::Path) -> ChunkProvider<JsonFileChunkLoader<PerlinChunkGenerator>> {
    let loader = JsonFileChunkLoader::new(root, PerlinChunkGenerator::new(99));
    ChunkProvider::new(loader, WorldInfo::new("e2e"), ProviderConfig::default())
        .unwrap()
        .with_generator(PerlinChunkGenerator::new(99))
}

#[test]
fn edits_survive_a_provider_restart() {
    let dir = tempfile::tempdir().unwrap();

    let provider = start(dir.path());
    provider.load_chunk_at(3, 4).wait().unwrap();
    provider
        .get_chunk_at(3, 4)
        .unwrap()
        .get_mut()
        .set_height(0, 0, 250);
    assert!(provider.save_chunk_at(3, 4));
    let report = provider.shutdown();
    assert_eq!(report.saves_persisted, 1);

    let provider = start(dir.path());
    assert!(provider.get_chunk_at(3, 4).is_none());
    provider.load_chunk_at(3, 4).wait().unwrap();

    let chunk = provider.get_chunk_at(3, 4).unwrap();
    assert_eq!(chunk.get().height_at(0, 0), 250);
    assert!(provider
        .loader()
        .is_stored(provider.world(), chunk_position(3, 4)));
}

#[test]
fn unsaved_chunks_are_regenerated_identically() {
    let dir = tempfile::tempdir().unwrap();
    let provider = start(dir.path());

    provider.load_chunk_at(-2, 8).wait().unwrap();

    let expected = provider
        .generator()
        .unwrap()
        .generate_chunk(chunk_position(-2, 8));
    assert_eq!(*provider.get_chunk_at(-2, 8).unwrap().get(), expected);
    assert!(!provider
        .loader()
        .is_stored(provider.world(), chunk_position(-2, 8)));
}

#[test]
fn edits_through_a_handle_keep_the_chunk_at_its_position() {
    let dir = tempfile::tempdir().unwrap();
    let provider = start(dir.path());
    provider.load_chunk_at(0, 0).wait().unwrap();

    {
        let handle = provider.get_chunk_at(0, 0).unwrap();
        let mut chunk = handle.get_mut();
        chunk.set_height(15, 15, 1);
        assert_eq!((chunk.x(), chunk.z()), (0, 0));
    }
    assert_eq!(
        provider.get_chunk_at(0, 0).unwrap().get().position(),
        chunk_position(0, 0)
    );

    assert!(provider.save_chunk_at(0, 0));
    let report = provider.shutdown();
    assert_eq!(report.saves_persisted, 1);

    let loader = JsonFileChunkLoader::new(dir.path(), PerlinChunkGenerator::new(99));
    let world = WorldInfo::new("e2e");
    assert!(loader.is_stored(&world, chunk_position(0, 0)));
    assert!(!loader.is_stored(&world, chunk_position(1, 0)));
}
