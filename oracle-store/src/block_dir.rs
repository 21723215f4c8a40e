use std::collections::{HashMap, HashSet};
use std::convert::TryInto;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, info, warn};

use oracle_chain::block::{self, Header, MAINNET_MAGIC};

use crate::StoreError;

/// A generous assumption of how few blocks fit in one 128 MB block file,
/// used to pick a starting file for the scan.
const BLOCKS_PER_FILE: u64 = 50;

/// Declared payload sizes outside this range are treated as garbage and
/// resynchronized over rather than trusted.
const MIN_BLOCK_SIZE: u32 = 81;
const MAX_BLOCK_SIZE: u32 = 1_000_000_000;

/// Where a block lives on disk, as discovered by [`BlockDir::scan`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockLocation {
    /// The `blk*.dat` file containing the record.
    pub file: PathBuf,
    /// Byte offset of the record's magic marker within the file.
    pub offset: u64,
    /// The declared payload size.
    pub size: u32,
    /// The header timestamp, extracted while scanning.
    pub time: DateTime<Utc>,
}

/// A node's `blocks/` directory.
#[derive(Clone, Debug)]
pub struct BlockDir {
    dir: PathBuf,
}

impl BlockDir {
    /// Open a block directory, refusing XOR-obfuscated stores.
    ///
    /// Nodes that obfuscate their block files record the key in
    /// `xor.dat`; an all-zero key means the files are plain. Reading
    /// obfuscated files is unsupported, so a non-zero key is fatal here
    /// rather than a garbled scan later.
    pub fn open(dir: impl Into<PathBuf>) -> Result<BlockDir, StoreError> {
        let dir = dir.into();
        let xor_path = dir.join("xor.dat");
        match std::fs::read(&xor_path) {
            Ok(key) => {
                if key.iter().any(|&b| b != 0) {
                    return Err(StoreError::XorRequired);
                }
                debug!(path = ?xor_path, "xor.dat present but all-zero, no de-obfuscation needed");
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io(e)),
        }
        Ok(BlockDir { dir })
    }

    /// The `blk*.dat` files in this directory, sorted by their index.
    pub fn block_files(&self) -> Result<Vec<(usize, PathBuf)>, StoreError> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = match name.to_str() {
                Some(name) => name,
                None => continue,
            };
            if let Some(index) = blk_index(name) {
                files.push((index, entry.path()));
            }
        }
        files.sort();
        Ok(files)
    }

    /// Walk block files from `start_index` onward until every target hash
    /// has a location, resynchronizing byte-by-byte over gaps and garbage.
    pub fn scan(
        &self,
        targets: &HashSet<block::Hash>,
        start_index: usize,
    ) -> Result<HashMap<block::Hash, BlockLocation>, StoreError> {
        let mut found = HashMap::with_capacity(targets.len());
        let files = self.block_files()?;

        for (index, path) in files.into_iter().filter(|(i, _)| *i >= start_index) {
            debug!(index, path = ?path, "scanning block file");
            self.scan_file(&path, targets, &mut found)?;
            info!(
                found = found.len(),
                wanted = targets.len(),
                "scanned {}",
                path.display()
            );
            if found.len() == targets.len() {
                return Ok(found);
            }
        }

        Err(StoreError::BlocksNotFound {
            missing: targets.len() - found.len(),
            wanted: targets.len(),
        })
    }

    fn scan_file(
        &self,
        path: &Path,
        targets: &HashSet<block::Hash>,
        found: &mut HashMap<block::Hash, BlockLocation>,
    ) -> Result<(), StoreError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let mut offset: u64 = 0;

        while offset + 8 <= len {
            let mut magic = [0u8; 4];
            reader.seek(SeekFrom::Start(offset))?;
            if reader.read_exact(&mut magic).is_err() {
                break;
            }
            if magic != MAINNET_MAGIC {
                // Files contain zero-padded tails and occasionally garbage;
                // slide forward one byte and try again.
                offset += 1;
                continue;
            }

            let mut size_bytes = [0u8; 4];
            if reader.read_exact(&mut size_bytes).is_err() {
                break;
            }
            let size = u32::from_le_bytes(size_bytes);
            if size < MIN_BLOCK_SIZE || size > MAX_BLOCK_SIZE {
                warn!(offset, size, "implausible record size, resynchronizing");
                offset += 1;
                continue;
            }

            let mut header = [0u8; Header::LEN];
            if reader.read_exact(&mut header).is_err() {
                break;
            }

            let hash = block::Hash::of_header_bytes(&header);
            if targets.contains(&hash) {
                let timestamp = u32::from_le_bytes(
                    header[Header::TIME_OFFSET..Header::TIME_OFFSET + 4]
                        .try_into()
                        .expect("fixed-width slice"),
                );
                found.insert(
                    hash,
                    BlockLocation {
                        file: path.to_path_buf(),
                        offset,
                        size,
                        time: Utc.timestamp(timestamp as i64, 0),
                    },
                );
                if found.len() == targets.len() {
                    return Ok(());
                }
            }

            offset += 8 + size as u64;
        }
        Ok(())
    }

    /// Read back the payload at a scanned location.
    pub fn read_block(&self, location: &BlockLocation) -> Result<Bytes, StoreError> {
        let mut file = File::open(&location.file)?;
        file.seek(SeekFrom::Start(location.offset))?;

        let mut prefix = [0u8; 8];
        file.read_exact(&mut prefix)?;
        if prefix[..4] != MAINNET_MAGIC {
            return Err(StoreError::Corrupt("magic marker vanished from record"));
        }
        if u32::from_le_bytes(prefix[4..8].try_into().expect("fixed-width slice")) != location.size
        {
            return Err(StoreError::Corrupt("record size changed since scan"));
        }

        let mut payload = vec![0u8; location.size as usize];
        file.read_exact(&mut payload)?;
        Ok(Bytes::from(payload))
    }
}

/// Estimate the first block file worth scanning when looking `depth`
/// blocks below the chain tip, given the highest file index present.
pub fn start_file_index(last_file_index: usize, depth: u64) -> usize {
    let files_back = (depth / BLOCKS_PER_FILE + 1) as usize + 1;
    last_file_index.saturating_sub(files_back)
}

/// The index of a `blkNNNNN.dat` file name, if it is one.
fn blk_index(name: &str) -> Option<usize> {
    let digits = name.strip_prefix("blk")?.strip_suffix(".dat")?;
    if digits.len() != 5 {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use oracle_test::synthetic;

    use super::*;

    fn hash_of(block: &synthetic::SyntheticBlock) -> block::Hash {
        block::Hash(block.hash)
    }

    fn write_dir(blocks_per_file: &[&[synthetic::SyntheticBlock]], gaps: bool) -> TempDir {
        let tmp = TempDir::new("oracle-store-test").expect("tempdir");
        for (i, blocks) in blocks_per_file.iter().enumerate() {
            let bytes = synthetic::blk_file_bytes(blocks, gaps);
            fs::write(tmp.path().join(format!("blk{:05}.dat", i)), bytes).expect("write blk file");
        }
        tmp
    }

    #[test]
    fn scan_finds_blocks_across_garbage_gaps() {
        oracle_test::init();

        let day = synthetic::price_day(63_000.0, 880_000, 1_736_899_200, 3);
        let tmp = write_dir(&[&day], true);
        let dir = BlockDir::open(tmp.path()).expect("open");

        let targets: HashSet<_> = day.iter().map(hash_of).collect();
        let found = dir.scan(&targets, 0).expect("all blocks present");
        assert_eq!(found.len(), 3);

        for block in &day {
            let location = &found[&hash_of(block)];
            assert_eq!(location.size as usize, block.payload.len());
            assert_eq!(location.time.timestamp(), block.time as i64);

            let payload = dir.read_block(location).expect("read back");
            assert_eq!(&payload[..], &block.payload[..]);
        }
    }

    #[test]
    fn scan_respects_start_index() {
        let day = synthetic::coinbase_only_day(880_000, 1_736_899_200, 4);
        let tmp = write_dir(&[&day[..2], &day[2..]], false);
        let dir = BlockDir::open(tmp.path()).expect("open");

        // Only the later file's blocks are wanted; skipping the first file
        // must not lose them.
        let targets: HashSet<_> = day[2..].iter().map(hash_of).collect();
        let found = dir.scan(&targets, 1).expect("blocks in second file");
        assert_eq!(found.len(), 2);
        assert!(found
            .values()
            .all(|location| location.file.ends_with("blk00001.dat")));
    }

    #[test]
    fn missing_blocks_are_reported() {
        let day = synthetic::coinbase_only_day(880_000, 1_736_899_200, 2);
        let tmp = write_dir(&[&day], false);
        let dir = BlockDir::open(tmp.path()).expect("open");

        let absent = synthetic::coinbase_only_day(999_000, 1_800_000_000, 1);
        let mut targets: HashSet<_> = day.iter().map(hash_of).collect();
        targets.insert(hash_of(&absent[0]));

        match dir.scan(&targets, 0) {
            Err(StoreError::BlocksNotFound { missing, wanted }) => {
                assert_eq!(missing, 1);
                assert_eq!(wanted, 3);
            }
            other => panic!("expected BlocksNotFound, got {:?}", other),
        }
    }

    #[test]
    fn zero_xor_key_is_accepted() {
        let tmp = TempDir::new("oracle-store-test").expect("tempdir");
        fs::write(tmp.path().join("xor.dat"), [0u8; 8]).expect("write xor.dat");
        assert!(BlockDir::open(tmp.path()).is_ok());
    }

    #[test]
    fn nonzero_xor_key_is_rejected() {
        let tmp = TempDir::new("oracle-store-test").expect("tempdir");
        fs::write(tmp.path().join("xor.dat"), [0, 0, 0, 1, 0, 0, 0, 0]).expect("write xor.dat");
        match BlockDir::open(tmp.path()) {
            Err(StoreError::XorRequired) => {}
            other => panic!("expected XorRequired, got {:?}", other),
        }
    }

    #[test]
    fn start_index_estimation_is_generous() {
        assert_eq!(start_file_index(100, 0), 98);
        assert_eq!(start_file_index(100, 144), 96);
        assert_eq!(start_file_index(2, 100_000), 0);
    }
}
