use shade_shared::log::{error, info, trace};

use crate::{
    asset_store::AssetStore,
    descriptor::GraphDescriptor,
    import_settings::{updated_import_settings, TextureImportSettings},
    material::{material_key, Material},
    shader::ShaderImportSettings,
    texture::resolve_texture,
    AssetKey, Error, PropertyName, Result, Shader,
};

/// Configuration of the [`Synchronizer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Name of the graph descriptor that is located next to the shader.
    pub descriptor_file_name: String,
    /// Extension of the images that back the texture nodes.
    pub image_extension: String,
    /// Extension of the material files.
    pub material_extension: String,
    /// Prefix of the names of the shaders that Shade generates. It's not part of the material name.
    pub shader_name_prefix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            descriptor_file_name: "Graph.json".to_owned(),
            image_extension: "png".to_owned(),
            material_extension: "mat".to_owned(),
            shader_name_prefix: "Shade/".to_owned(),
        }
    }
}

/// Outcome of synchronizing the material of a single shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub material: AssetKey,
    /// Whether the material had to be created.
    pub created: bool,
    /// Textures that have been bound in the order of the nodes.
    pub bound: Vec<(PropertyName, AssetKey)>,
    /// Properties of texture nodes whose image doesn't exist.
    pub skipped: Vec<PropertyName>,
}

/// Creates or updates the materials of shaders according to their graph descriptors.
///
/// Every run reads everything from the store again, so running it repeatedly on an unchanged
/// descriptor leaves the store unchanged.
pub struct Synchronizer<'s, S: AssetStore> {
    store: &'s mut S,
    config: SyncConfig,
}

impl<'s, S: AssetStore> Synchronizer<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self::with_config(store, SyncConfig::default())
    }

    pub fn with_config(store: &'s mut S, config: SyncConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the key of the material that belongs to the shader.
    pub fn material_key(&self, shader: &Shader) -> AssetKey {
        material_key(shader, &self.config.shader_name_prefix, &self.config.material_extension)
    }

    /// Returns the key of the graph descriptor that belongs to the shader.
    pub fn descriptor_key(&self, shader: &Shader) -> AssetKey {
        AssetKey::new(shader.directory().join(&self.config.descriptor_file_name))
    }

    /// Loads the material of the shader without modifying anything.
    pub fn find_material(&self, shader: &Shader) -> Result<Option<Material>> {
        self.store.load_asset(&self.material_key(shader))
    }

    pub fn material_exists(&self, shader: &Shader) -> bool {
        self.store.exists(&self.material_key(shader))
    }

    /// Creates or updates the material of the shader and configures the textures referenced by its graph.
    ///
    /// Missing textures are skipped. A missing or malformed descriptor fails the synchronization
    /// before anything has been written.
    pub fn synchronize(&mut self, shader: &Shader) -> Result<SyncReport> {
        info!("Synchronizing material of shader '{}' ({})", shader.name(), shader.asset_key());

        let mut shader_settings = self
            .store
            .load_import_settings::<ShaderImportSettings>(shader.asset_key())?
            .ok_or_else(|| Error::MissingShader(shader.asset_key().clone()))?;

        // Nothing is written before all nodes have been processed.
        let material_key = self.material_key(shader);
        let (mut material, created) = match self.store.load_asset::<Material>(&material_key)? {
            Some(mut material) => {
                material.shader = shader.asset_key().clone();
                (material, false)
            }
            None => (Material::new(shader, &shader_settings), true),
        };

        let descriptor = self.load_descriptor(shader)?;

        let mut report = SyncReport {
            material: material_key.clone(),
            created,
            bound: Vec::new(),
            skipped: Vec::new(),
        };
        let mut texture_settings: Vec<(AssetKey, TextureImportSettings)> = Vec::new();

        for node in &descriptor.nodes {
            let Some(options) = &node.options else {
                continue;
            };
            let Some(property_name) = options.user_label().and_then(PropertyName::from_label) else {
                continue;
            };
            if !node.kind.is_texture_like() {
                trace!("Property {property_name} of {:?} node is not a texture", node.kind);
                continue;
            }

            let Some(texture) = resolve_texture(&*self.store, shader.directory(), options, &self.config.image_extension) else {
                report.skipped.push(property_name);
                continue;
            };

            trace!("Binding {texture} to {property_name}");
            material.set_texture(property_name.clone(), texture.clone());
            shader_settings.default_textures.insert(property_name.clone(), texture.clone());
            // Nodes that share an image modify the same settings.
            if let Some((_, settings)) = texture_settings.iter_mut().find(|(key, _)| *key == texture) {
                settings.apply(options);
            } else if let Some(settings) = updated_import_settings(&*self.store, &texture, options)? {
                texture_settings.push((texture.clone(), settings));
            }
            report.bound.push((property_name, texture));
        }

        if created {
            self.store.create_asset(&material_key, &material)?;
        } else {
            self.store.save_asset(&material_key, &material)?;
        }
        for (texture, settings) in &texture_settings {
            self.store.save_and_reimport(texture, settings)?;
        }
        self.store.save_and_reimport(shader.asset_key(), &shader_settings)?;

        info!(
            "Synchronized {material_key}: {} bound, {} skipped",
            report.bound.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Synchronizes all shaders. A failure is logged and doesn't stop the remaining shaders.
    pub fn synchronize_all(&mut self, shaders: impl IntoIterator<Item = Shader>) -> Vec<(Shader, Result<SyncReport>)> {
        shaders
            .into_iter()
            .map(|shader| {
                let result = self.synchronize(&shader);
                if let Err(err) = &result {
                    error!("Failed to synchronize the material of shader '{}': {err}", shader.name());
                }
                (shader, result)
            })
            .collect()
    }

    fn load_descriptor(&self, shader: &Shader) -> Result<GraphDescriptor> {
        let descriptor_key = self.descriptor_key(shader);
        let Some(content) = self.store.read(&descriptor_key)? else {
            return Err(Error::MissingDescriptor(descriptor_key));
        };
        GraphDescriptor::parse(&descriptor_key, &content)
    }
}

#[cfg(test)]
mod tests {
    use shade_shared::indoc::indoc;
    use shade_test::setup_logger;

    use crate::{
        asset_store::{MemoryStore, ReadAsset},
        import_settings::{FilterMode, TextureImportSettings, TextureType, WrapMode},
    };

    use super::*;

    const SHADER_KEY: &str = "Root/Shade/Surface/Foo/Foo.shader";
    const GRAPH_KEY: &str = "Root/Shade/Surface/Foo/Graph.json";
    const MATERIAL_KEY: &str = "Root/Shade/Surface/Foo.mat";
    const PNG: [u8; 4] = [0x89, 0x50, 0x4e, 0x47];

    fn shader() -> Shader {
        Shader::new(SHADER_KEY, "Shade/Foo")
    }

    fn property(label: &str) -> PropertyName {
        PropertyName::from_label(label).unwrap()
    }

    fn texture_key(name: &str) -> AssetKey {
        AssetKey::new(format!("Root/Shade/Surface/Foo/{name}.png"))
    }

    fn store_with(graph: &str, textures: &[&str]) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert(SHADER_KEY, "Shader \"Shade/Foo\" {}");
        store.insert(GRAPH_KEY, graph);
        for texture in textures {
            store.insert(texture_key(texture), PNG);
        }
        store
    }

    fn texture_settings(store: &MemoryStore, name: &str) -> TextureImportSettings {
        store.load_import_settings(&texture_key(name)).unwrap().unwrap()
    }

    fn material(store: &MemoryStore) -> Material {
        store.load_asset(&AssetKey::new(MATERIAL_KEY)).unwrap().unwrap()
    }

    #[test]
    fn smoke() {
        setup_logger();
        let mut store = store_with(
            indoc! {r#"
                {
                    "nodes": [
                        { "name": "Texture", "options": { "userLabel": "Base Color", "wrapMode": "repeat", "filterMode": "linear", "generateMipmaps": true } },
                        { "name": "Texture", "options": { "userLabel": "Normals", "isNormalMap": true, "filterMode": "point" } },
                        { "name": "Color", "options": { "userLabel": "Tint" } },
                        { "name": "Multiply" }
                    ]
                }
            "#},
            &["Base Color", "Normals"],
        );

        let report = Synchronizer::new(&mut store).synchronize(&shader()).unwrap();
        assert!(report.created);
        assert_eq!(report.material, AssetKey::new(MATERIAL_KEY));
        assert_eq!(
            report.bound,
            vec![
                (property("Base Color"), texture_key("Base Color")),
                (property("Normals"), texture_key("Normals")),
            ]
        );
        assert!(report.skipped.is_empty());

        let material = material(&store);
        assert_eq!(material.shader, AssetKey::new(SHADER_KEY));
        assert_eq!(material.textures.len(), 2);
        assert_eq!(material.texture(&property("Base Color")), Some(&texture_key("Base Color")));
        assert_eq!(material.texture(&property("Normals")), Some(&texture_key("Normals")));

        assert_eq!(
            texture_settings(&store, "Base Color"),
            TextureImportSettings {
                wrap_mode: WrapMode::Repeat,
                filter_mode: FilterMode::Trilinear,
                texture_type: TextureType::Default,
                ..TextureImportSettings::default()
            }
        );
        assert_eq!(
            texture_settings(&store, "Normals"),
            TextureImportSettings {
                wrap_mode: WrapMode::Clamp,
                filter_mode: FilterMode::Point,
                texture_type: TextureType::NormalMap,
                ..TextureImportSettings::default()
            }
        );

        let shader_settings: ShaderImportSettings = store.load_import_settings(&AssetKey::new(SHADER_KEY)).unwrap().unwrap();
        assert_eq!(shader_settings.default_textures, material.textures);
        assert_eq!(
            store.reimported(),
            &[texture_key("Base Color"), texture_key("Normals"), AssetKey::new(SHADER_KEY)]
        );
    }

    #[test]
    fn second_run_changes_nothing() {
        setup_logger();
        let mut store = store_with(
            r#"{ "nodes": [
                { "name": "Texture", "options": { "userLabel": "Base Color", "wrapMode": "mirror" } },
                { "name": "Gradient", "options": { "userLabel": "Ramp", "filterMode": "linear" } },
                { "name": "Tiler", "options": { "userLabel": "Missing" } }
            ] }"#,
            &["Base Color", "Ramp"],
        );

        let first_report = Synchronizer::new(&mut store).synchronize(&shader()).unwrap();
        let after_first_run = store.assets().clone();
        let second_report = Synchronizer::new(&mut store).synchronize(&shader()).unwrap();

        assert_eq!(store.assets(), &after_first_run);
        assert!(first_report.created);
        assert!(!second_report.created);
        assert_eq!(first_report.bound, second_report.bound);
    }

    #[test]
    fn missing_wrap_mode_resets_to_clamp() {
        let mut store = store_with(r#"{ "nodes": [ { "name": "Texture", "options": { "userLabel": "Albedo" } } ] }"#, &["Albedo"]);
        let repeating = TextureImportSettings {
            wrap_mode: WrapMode::Repeat,
            ..TextureImportSettings::default()
        };
        store.save_asset(&texture_key("Albedo").import_settings_key(), &repeating).unwrap();

        Synchronizer::new(&mut store).synchronize(&shader()).unwrap();
        assert_eq!(texture_settings(&store, "Albedo").wrap_mode, WrapMode::Clamp);
    }

    #[test]
    fn unrecognized_wrap_mode_keeps_previous_value() {
        let mut store = store_with(
            r#"{ "nodes": [ { "name": "Texture", "options": { "userLabel": "Albedo", "wrapMode": "diagonal" } } ] }"#,
            &["Albedo"],
        );
        let mirrored = TextureImportSettings {
            wrap_mode: WrapMode::Mirror,
            ..TextureImportSettings::default()
        };
        store.save_asset(&texture_key("Albedo").import_settings_key(), &mirrored).unwrap();

        Synchronizer::new(&mut store).synchronize(&shader()).unwrap();
        assert_eq!(texture_settings(&store, "Albedo").wrap_mode, WrapMode::Mirror);
    }

    #[test]
    fn missing_texture_is_skipped() {
        setup_logger();
        let mut store = store_with(
            r#"{ "nodes": [
                { "name": "Texture", "options": { "userLabel": "Not Painted Yet" } },
                { "name": "Bake", "options": { "userLabel": "Occlusion" } }
            ] }"#,
            &["Occlusion"],
        );

        let report = Synchronizer::new(&mut store).synchronize(&shader()).unwrap();
        assert_eq!(report.skipped, vec![property("Not Painted Yet")]);
        assert_eq!(report.bound, vec![(property("Occlusion"), texture_key("Occlusion"))]);

        let material = material(&store);
        assert_eq!(material.texture(&property("Not Painted Yet")), None);
        assert!(!store.exists(&texture_key("Not Painted Yet")));
        assert!(!store.exists(&texture_key("Not Painted Yet").import_settings_key()));
        assert!(!store.reimported().contains(&texture_key("Not Painted Yet")));
    }

    #[test]
    fn last_node_wins() {
        let mut store = store_with(
            r#"{ "nodes": [
                { "name": "Texture", "options": { "userLabel": "Albedo", "value": "first" } },
                { "name": "Texture", "options": { "userLabel": "albedo", "value": "second" } }
            ] }"#,
            &["first", "second"],
        );

        Synchronizer::new(&mut store).synchronize(&shader()).unwrap();
        assert_eq!(material(&store).texture(&property("Albedo")), Some(&texture_key("second")));
    }

    #[test]
    fn existing_material_is_rebound_to_shader() {
        let mut store = store_with(r#"{ "nodes": [ { "name": "Texture", "options": { "userLabel": "Albedo" } } ] }"#, &["Albedo"]);
        store.insert(
            MATERIAL_KEY,
            "shader: Root/Shade/Surface/Foo/FooOld.shader\ntextures:\n  _detail: Root/detail.png\n",
        );

        let report = Synchronizer::new(&mut store).synchronize(&shader()).unwrap();
        assert!(!report.created);
        let material = material(&store);
        assert_eq!(material.shader, AssetKey::new(SHADER_KEY));
        assert_eq!(material.texture(&property("Detail")), Some(&AssetKey::new("Root/detail.png")));
        assert_eq!(material.texture(&property("Albedo")), Some(&texture_key("Albedo")));
    }

    #[test]
    fn new_material_starts_with_default_textures() {
        let mut store = store_with(r#"{ "nodes": [] }"#, &[]);
        let mut shader_settings = ShaderImportSettings::default();
        shader_settings
            .default_textures
            .insert(property("Noise"), AssetKey::new("Root/noise.png"));
        store.save_asset(&AssetKey::new(SHADER_KEY).import_settings_key(), &shader_settings).unwrap();

        Synchronizer::new(&mut store).synchronize(&shader()).unwrap();
        assert_eq!(material(&store).texture(&property("Noise")), Some(&AssetKey::new("Root/noise.png")));
    }

    #[test]
    fn non_texture_nodes_are_not_resolved() {
        let mut store = store_with(r#"{ "nodes": [ { "name": "Color", "options": { "userLabel": "Tint" } } ] }"#, &["Tint"]);
        let report = Synchronizer::new(&mut store).synchronize(&shader()).unwrap();
        assert!(report.bound.is_empty());
        assert!(report.skipped.is_empty());
        assert!(!store.exists(&texture_key("Tint").import_settings_key()));
    }

    #[test]
    fn missing_descriptor_writes_nothing() {
        let mut store = MemoryStore::new();
        store.insert(SHADER_KEY, "Shader \"Shade/Foo\" {}");
        let before = store.clone();

        let result = Synchronizer::new(&mut store).synchronize(&shader());
        assert!(matches!(result, Err(Error::MissingDescriptor(key)) if key == AssetKey::new(GRAPH_KEY)));
        assert_eq!(store, before);
    }

    #[test]
    fn malformed_descriptor_writes_nothing() {
        let mut store = store_with(r#"{ "nodes": [ { "name": "Texture", "options": "#, &["Albedo"]);
        let before = store.clone();

        let result = Synchronizer::new(&mut store).synchronize(&shader());
        assert!(matches!(result, Err(Error::MalformedDescriptor { .. })));
        assert_eq!(store, before);
    }

    #[test]
    fn fixed_descriptor_converges_to_clean_run() {
        let graph = r#"{ "nodes": [ { "name": "Texture", "options": { "userLabel": "Albedo" } } ] }"#;
        let mut clean = store_with(graph, &["Albedo"]);
        Synchronizer::new(&mut clean).synchronize(&shader()).unwrap();

        let mut fixed = store_with("{ broken", &["Albedo"]);
        assert!(Synchronizer::new(&mut fixed).synchronize(&shader()).is_err());
        fixed.insert(GRAPH_KEY, graph);
        Synchronizer::new(&mut fixed).synchronize(&shader()).unwrap();

        assert_eq!(fixed.assets(), clean.assets());
    }

    #[test]
    fn corrupt_import_settings_write_nothing() {
        let mut store = store_with(
            r#"{ "nodes": [
                { "name": "Texture", "options": { "userLabel": "Albedo" } },
                { "name": "Texture", "options": { "userLabel": "Normals" } }
            ] }"#,
            &["Albedo", "Normals"],
        );
        store.insert(texture_key("Normals").import_settings_key(), "wrap_mode: [clamp");
        let before = store.clone();

        let result = Synchronizer::new(&mut store).synchronize(&shader());
        assert!(matches!(result, Err(Error::InvalidAssetData(_))));
        assert_eq!(store, before);
    }

    #[test]
    fn shared_image_gets_settings_of_last_node() {
        let mut store = store_with(
            r#"{ "nodes": [
                { "name": "Texture", "options": { "userLabel": "Albedo", "value": "shared", "filterMode": "point" } },
                { "name": "Texture", "options": { "userLabel": "Detail", "value": "shared", "wrapMode": "mirror" } }
            ] }"#,
            &["shared"],
        );

        Synchronizer::new(&mut store).synchronize(&shader()).unwrap();
        let settings = texture_settings(&store, "shared");
        assert_eq!(settings.wrap_mode, WrapMode::Mirror);
        assert_eq!(settings.filter_mode, FilterMode::Point);
        assert_eq!(store.reimported(), &[texture_key("shared"), AssetKey::new(SHADER_KEY)]);
    }

    #[test]
    fn unmanaged_keys_survive_synchronization() {
        let mut store = store_with(r#"{ "nodes": [ { "name": "Texture", "options": { "userLabel": "Albedo" } } ] }"#, &["Albedo"]);
        store.insert(texture_key("Albedo").import_settings_key(), "wrap_mode: repeat\nmax_size: 1024\nsrgb: false\n");
        store.insert(
            MATERIAL_KEY,
            "shader: Root/Shade/Surface/Foo/Foo.shader\ntextures: {}\nglossiness: 0.5\n",
        );
        store.insert(AssetKey::new(SHADER_KEY).import_settings_key(), "default_textures: {}\nkeywords:\n- FOG\n");

        Synchronizer::new(&mut store).synchronize(&shader()).unwrap();
        let read = |key: &str| String::from_utf8(store.read(&AssetKey::new(key)).unwrap().unwrap()).unwrap();
        assert_eq!(
            read("Root/Shade/Surface/Foo/Albedo.png.meta"),
            "wrap_mode: clamp\nfilter_mode: bilinear\ntexture_type: default\nmax_size: 1024\nsrgb: false\n"
        );
        assert_eq!(
            read(MATERIAL_KEY),
            "shader: Root/Shade/Surface/Foo/Foo.shader\ntextures:\n  _albedo: Root/Shade/Surface/Foo/Albedo.png\nglossiness: 0.5\n"
        );
        assert_eq!(
            read(&format!("{SHADER_KEY}.meta")),
            "default_textures:\n  _albedo: Root/Shade/Surface/Foo/Albedo.png\nkeywords:\n- FOG\n"
        );
    }

    #[test]
    fn missing_shader() {
        let mut store = MemoryStore::new();
        let result = Synchronizer::new(&mut store).synchronize(&shader());
        assert!(matches!(result, Err(Error::MissingShader(_))));
    }

    #[test]
    fn find_material() {
        let mut store = store_with(r#"{ "nodes": [] }"#, &[]);
        let mut synchronizer = Synchronizer::new(&mut store);
        assert!(!synchronizer.material_exists(&shader()));
        assert_eq!(synchronizer.find_material(&shader()).unwrap(), None);

        synchronizer.synchronize(&shader()).unwrap();
        assert!(synchronizer.material_exists(&shader()));
        let material = synchronizer.find_material(&shader()).unwrap().unwrap();
        assert_eq!(material.shader, AssetKey::new(SHADER_KEY));
    }

    #[test]
    fn batch_continues_after_failure() {
        setup_logger();
        let mut store = store_with(r#"{ "nodes": [ { "name": "Texture", "options": { "userLabel": "Albedo" } } ] }"#, &["Albedo"]);
        store.insert("Root/Shade/Bar/Bar.shader", "Shader \"Shade/Bar\" {}");
        let bar = Shader::new("Root/Shade/Bar/Bar.shader", "Shade/Bar");

        let results = Synchronizer::new(&mut store).synchronize_all(vec![bar.clone(), shader()]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, bar);
        assert!(matches!(results[0].1, Err(Error::MissingDescriptor(_))));
        assert_eq!(results[1].0, shader());
        assert!(results[1].1.is_ok());
        assert!(!store.exists(&AssetKey::new("Root/Shade/Bar.mat")));
        assert!(store.exists(&AssetKey::new(MATERIAL_KEY)));
    }

    #[test]
    fn custom_config() {
        let mut store = MemoryStore::new();
        store.insert(SHADER_KEY, "Shader \"Shade/Foo\" {}");
        store.insert(
            "Root/Shade/Surface/Foo/graph.json",
            r#"{ "nodes": [ { "name": "Texture", "options": { "userLabel": "Albedo" } } ] }"#,
        );
        store.insert("Root/Shade/Surface/Foo/Albedo.tga", PNG);
        let config = SyncConfig {
            descriptor_file_name: "graph.json".to_owned(),
            image_extension: "tga".to_owned(),
            material_extension: "material".to_owned(),
            ..SyncConfig::default()
        };

        let report = Synchronizer::with_config(&mut store, config).synchronize(&shader()).unwrap();
        assert_eq!(report.material, AssetKey::new("Root/Shade/Surface/Foo.material"));
        assert_eq!(report.bound, vec![(property("Albedo"), AssetKey::new("Root/Shade/Surface/Foo/Albedo.tga"))]);
    }
}
