// Groth16 key material for the key commitment relation: setup ceremony,
// persistence, validated loading, and the process-wide read-only handle.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ark_bn254::Bn254;
use ark_groth16::{prepare_verifying_key, Groth16, PreparedVerifyingKey, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use parking_lot::RwLock;
use rand::{CryptoRng, RngCore};
use tracing::{info, warn};

use crate::circuit::Relation;
use crate::error::{Result, ZkError};

/// Where the two key files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    pub proving_key: PathBuf,
    pub verifying_key: PathBuf,
}

impl KeyPaths {
    pub fn new(proving_key: impl Into<PathBuf>, verifying_key: impl Into<PathBuf>) -> Self {
        Self {
            proving_key: proving_key.into(),
            verifying_key: verifying_key.into(),
        }
    }
}

/// A matched proving/verifying key pair from one setup run.
pub struct KeyMaterial {
    proving_key: ProvingKey<Bn254>,
    prepared: PreparedVerifyingKey<Bn254>,
}

impl KeyMaterial {
    /// Run the circuit-specific Groth16 setup. Randomized: two runs never
    /// produce interchangeable keys.
    pub fn setup<R: RngCore + CryptoRng>(relation: &Relation, rng: &mut R) -> Result<Self> {
        let pk = Groth16::<Bn254>::generate_random_parameters_with_reduction(
            relation.blank_circuit(),
            rng,
        )
        .map_err(|e| ZkError::RelationCompile(format!("setup failed: {e}")))?;
        Self::from_proving_key(relation, pk)
    }

    /// The verifying key is embedded in the proving key.
    pub fn from_proving_key(relation: &Relation, proving_key: ProvingKey<Bn254>) -> Result<Self> {
        relation.check_proving_key(&proving_key)?;
        let prepared = prepare_verifying_key(&proving_key.vk);
        Ok(Self {
            proving_key,
            prepared,
        })
    }

    pub fn from_parts(
        relation: &Relation,
        proving_key: ProvingKey<Bn254>,
        verifying_key: VerifyingKey<Bn254>,
    ) -> Result<Self> {
        if proving_key.vk != verifying_key {
            return Err(ZkError::IncompatibleKeys(
                "proving and verifying keys come from different setups".into(),
            ));
        }
        Self::from_proving_key(relation, proving_key)
    }

    pub fn load(relation: &Relation, paths: &KeyPaths) -> Result<Self> {
        let pk = load_proving_key(&paths.proving_key)?;
        let vk = load_verifying_key(&paths.verifying_key)?;
        let material = Self::from_parts(relation, pk, vk)?;
        info!(
            proving_key = %paths.proving_key.display(),
            verifying_key = %paths.verifying_key.display(),
            "key material loaded"
        );
        Ok(material)
    }

    pub fn save(&self, paths: &KeyPaths) -> Result<()> {
        save_proving_key(&self.proving_key, &paths.proving_key)?;
        save_verifying_key(self.verifying_key(), &paths.verifying_key)?;
        Ok(())
    }

    pub fn proving_key(&self) -> &ProvingKey<Bn254> {
        &self.proving_key
    }

    pub fn verifying_key(&self) -> &VerifyingKey<Bn254> {
        &self.proving_key.vk
    }

    pub fn prepared_verifying_key(&self) -> &PreparedVerifyingKey<Bn254> {
        &self.prepared
    }
}

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ZkError::key_material(path, e))?;
    }
    let file = File::create(path).map_err(|e| ZkError::key_material(path, e))?;
    Ok(BufWriter::new(file))
}

fn open_file(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| ZkError::key_material(path, e))?;
    Ok(BufReader::new(file))
}

pub fn save_proving_key(pk: &ProvingKey<Bn254>, path: &Path) -> Result<()> {
    let mut out = create_file(path)?;
    pk.serialize_uncompressed(&mut out)
        .map_err(|e| ZkError::key_material(path, e))?;
    out.flush().map_err(|e| ZkError::key_material(path, e))?;
    Ok(())
}

pub fn save_verifying_key(vk: &VerifyingKey<Bn254>, path: &Path) -> Result<()> {
    let mut out = create_file(path)?;
    vk.serialize_uncompressed(&mut out)
        .map_err(|e| ZkError::key_material(path, e))?;
    out.flush().map_err(|e| ZkError::key_material(path, e))?;
    Ok(())
}

/// Load a proving key from a binary file. Curve points are validated.
pub fn load_proving_key(path: &Path) -> Result<ProvingKey<Bn254>> {
    let reader = open_file(path)?;
    ProvingKey::<Bn254>::deserialize_uncompressed(reader)
        .map_err(|e| ZkError::key_material(path, format!("not a BN254 proving key: {e}")))
}

/// Load a verifying key from a binary file. Curve points are validated.
pub fn load_verifying_key(path: &Path) -> Result<VerifyingKey<Bn254>> {
    let reader = open_file(path)?;
    VerifyingKey::<Bn254>::deserialize_uncompressed(reader)
        .map_err(|e| ZkError::key_material(path, format!("not a BN254 verifying key: {e}")))
}

/// Process-wide handle on the current key material.
///
/// Requests clone the inner `Arc` and work on that snapshot; a reload swaps
/// the pointer and never mutates material a request is holding.
pub struct KeyRing {
    relation: Arc<Relation>,
    paths: Option<KeyPaths>,
    current: RwLock<Arc<KeyMaterial>>,
}

impl KeyRing {
    pub fn load(relation: Arc<Relation>, paths: KeyPaths) -> Result<Self> {
        let material = KeyMaterial::load(&relation, &paths)?;
        Ok(Self {
            relation,
            paths: Some(paths),
            current: RwLock::new(Arc::new(material)),
        })
    }

    /// Key ring over in-memory material; `reload` is a no-op.
    pub fn from_material(relation: Arc<Relation>, material: KeyMaterial) -> Self {
        Self {
            relation,
            paths: None,
            current: RwLock::new(Arc::new(material)),
        }
    }

    pub fn relation(&self) -> &Arc<Relation> {
        &self.relation
    }

    pub fn current(&self) -> Arc<KeyMaterial> {
        self.current.read().clone()
    }

    /// Re-read both key files. On failure the previous material stays active.
    ///
    /// Every credential enrolled under the old material stops verifying once
    /// different keys are swapped in.
    pub fn reload(&self) -> Result<()> {
        let Some(paths) = &self.paths else {
            warn!("key ring has no backing files, reload skipped");
            return Ok(());
        };
        let material = KeyMaterial::load(&self.relation, paths)?;
        *self.current.write() = Arc::new(material);
        info!("key material reloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ark_std::rand::rngs::StdRng;
    use ark_std::rand::SeedableRng;

    #[test]
    fn missing_file_is_a_configuration_error() {
        let err = load_verifying_key(Path::new("/definitely/not/here/vk.bin")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("/definitely/not/here/vk.bin"));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vk.bin");
        fs::write(&path, b"definitely not a key").unwrap();
        let err = load_verifying_key(&path).unwrap_err();
        assert!(matches!(err, ZkError::KeyMaterial { .. }));
    }

    #[test]
    fn save_then_load_restores_the_same_keys() {
        let relation = Relation::compile().unwrap();
        let material = KeyMaterial::setup(&relation, &mut StdRng::seed_from_u64(0)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let paths = KeyPaths::new(dir.path().join("keys/pk.bin"), dir.path().join("keys/vk.bin"));
        material.save(&paths).unwrap();

        let loaded = KeyMaterial::load(&relation, &paths).unwrap();
        assert!(loaded.verifying_key() == material.verifying_key());
    }

    #[test]
    fn mismatched_pair_is_rejected() {
        let relation = Relation::compile().unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let a = KeyMaterial::setup(&relation, &mut rng).unwrap();
        let b = KeyMaterial::setup(&relation, &mut rng).unwrap();

        let err = KeyMaterial::from_parts(
            &relation,
            a.proving_key().clone(),
            b.verifying_key().clone(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ZkError::IncompatibleKeys(_)));
    }

    #[test]
    fn proving_key_for_another_witness_layout_is_rejected() {
        let relation = Relation::compile().unwrap();
        let material = KeyMaterial::setup(&relation, &mut StdRng::seed_from_u64(1)).unwrap();

        let mut pk = material.proving_key().clone();
        pk.l_query.pop();
        let err = KeyMaterial::from_proving_key(&relation, pk).err().unwrap();
        assert!(matches!(err, ZkError::IncompatibleKeys(_)));
    }

    #[test]
    fn failed_reload_keeps_previous_material() {
        let relation = Arc::new(Relation::compile().unwrap());
        let material = KeyMaterial::setup(&relation, &mut StdRng::seed_from_u64(0)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let paths = KeyPaths::new(dir.path().join("pk.bin"), dir.path().join("vk.bin"));
        material.save(&paths).unwrap();

        let ring = KeyRing::load(relation, paths.clone()).unwrap();
        let before = ring.current();

        fs::remove_file(&paths.verifying_key).unwrap();
        assert!(ring.reload().is_err());
        assert!(Arc::ptr_eq(&before, &ring.current()));
    }
}
