//! Remote Registry client

use super::protocol::*;
use crate::call::{call, RpcRequest};
use crate::error::{Result, RpcError};
use crate::handles::HandleCache;
use crate::status::Win32Error;
use crate::transport::RpcTransport;
use msrpc_ndr::ContextHandle;
use tracing::debug;

/// Buffer sizes the registry client offers the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Key and value name buffer, in UTF-16 code units
    pub name_buffer_chars: u16,
    /// Data buffer for the first attempt at a value, in bytes
    pub initial_data_buffer: u32,
    /// Largest data buffer to retry with after `ERROR_MORE_DATA`
    pub max_data_buffer: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name_buffer_chars: 256,
            initial_data_buffer: 512,
            max_data_buffer: 1024 * 1024,
        }
    }
}

/// A key path split into its hive and subkey components
#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyPath {
    hive: Hive,
    components: Vec<String>,
}

impl KeyPath {
    /// Parse `HKLM\SOFTWARE\Microsoft`; `/` also separates components
    fn parse(path: &str) -> Result<Self> {
        let mut parts = path.split(['\\', '/']).filter(|part| !part.is_empty());
        let hive = parts
            .next()
            .and_then(Hive::from_name)
            .ok_or_else(|| RpcError::InvalidArgument(format!("no registry hive in key path {path:?}")))?;
        Ok(Self {
            hive,
            components: parts.map(str::to_owned).collect(),
        })
    }

    fn root(&self) -> Self {
        Self {
            hive: self.hive,
            components: Vec::new(),
        }
    }

    fn sub_key(&self) -> String {
        self.components.join("\\")
    }

    /// Registry names are case-insensitive, so the cache key is uppercased
    fn cache_key(&self) -> String {
        let mut key = self.hive.short_name().to_owned();
        for component in &self.components {
            key.push('\\');
            key.push_str(&component.to_uppercase());
        }
        key
    }
}

/// Remote Registry client
///
/// Keys are addressed by path (`HKLM\SYSTEM\CurrentControlSet`). Every key
/// opened on the way is cached, so browsing a subtree opens each key once;
/// [`close_all`](Self::close_all) releases them.
pub struct RegistryClient<T> {
    transport: T,
    config: RegistryConfig,
    desired_access: u32,
    handles: HandleCache,
}

impl<T: RpcTransport> RegistryClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, RegistryConfig::default())
    }

    pub fn with_config(transport: T, config: RegistryConfig) -> Self {
        Self {
            transport,
            config,
            desired_access: access::KEY_READ,
            handles: HandleCache::new(),
        }
    }

    /// Access requested for every key this client opens
    pub fn with_access(mut self, desired_access: u32) -> Self {
        self.desired_access = desired_access;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Open a predefined root key, bypassing the cache
    pub fn open_hive(&self, hive: Hive, desired_access: u32) -> Result<ContextHandle> {
        let handle = match hive {
            Hive::ClassesRoot => self.open_root(&OpenClassesRoot { desired_access })?,
            Hive::CurrentUser => self.open_root(&OpenCurrentUser { desired_access })?,
            Hive::LocalMachine => self.open_root(&OpenLocalMachine { desired_access })?,
            Hive::Users => self.open_root(&OpenUsers { desired_access })?,
        };
        debug!("Opened hive {}", hive);
        Ok(handle)
    }

    fn open_root<R>(&self, request: &R) -> Result<ContextHandle>
    where
        R: RpcRequest<Response = crate::call::HandleResponse<Win32Error>>,
    {
        let response = call(&self.transport, request)?;
        response.status.check(R::NAME)?;
        Ok(response.handle)
    }

    /// Open `sub_key` relative to an open key, bypassing the cache
    pub fn open_sub_key(&self, key: &ContextHandle, sub_key: &str, desired_access: u32) -> Result<ContextHandle> {
        let response = call(
            &self.transport,
            &BaseRegOpenKey {
                key: *key,
                sub_key: sub_key.to_owned(),
                options: 0,
                desired_access,
            },
        )?;
        response.status.check(BaseRegOpenKey::NAME)?;
        debug!("Opened key {}", sub_key);
        Ok(response.handle)
    }

    /// Handle for the key at `path`, from the cache when possible
    pub fn open_key(&self, path: &str) -> Result<ContextHandle> {
        self.open_path(&KeyPath::parse(path)?)
    }

    fn open_path(&self, path: &KeyPath) -> Result<ContextHandle> {
        self.handles.get_or_open(&path.cache_key(), || {
            if path.components.is_empty() {
                return self.open_hive(path.hive, self.desired_access);
            }
            let root = self.open_path(&path.root())?;
            self.open_sub_key(&root, &path.sub_key(), self.desired_access)
        })
    }

    /// Close a handle that is not in the cache
    pub fn close(&self, key: ContextHandle) -> Result<()> {
        let response = call(&self.transport, &BaseRegCloseKey { key })?;
        response.status.check(BaseRegCloseKey::NAME)?;
        debug!("Closed key handle {:?}", key);
        Ok(())
    }

    /// Close and forget the cached handle for `path`, if any
    pub fn close_key(&self, path: &str) -> Result<()> {
        match self.handles.remove(&KeyPath::parse(path)?.cache_key()) {
            Some(handle) => self.close(handle),
            None => Ok(()),
        }
    }

    /// Close every cached handle
    ///
    /// Every handle is attempted; the first failure is returned.
    pub fn close_all(&self) -> Result<()> {
        let mut first_error = None;
        for (path, handle) in self.handles.drain() {
            debug!("Closing cached key {}", path);
            if let Err(err) = self.close(handle) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Names of the subkeys of `path`
    pub fn enum_keys(&self, path: &str) -> Result<Vec<String>> {
        let key = self.open_key(path)?;
        let mut names = Vec::new();
        for index in 0.. {
            let response = call(
                &self.transport,
                &BaseRegEnumKey {
                    key,
                    index,
                    name_capacity: self.config.name_buffer_chars,
                },
            )?;
            if response.error == Win32Error::NO_MORE_ITEMS {
                break;
            }
            response.error.check(BaseRegEnumKey::NAME)?;
            names.push(response.name);
        }
        Ok(names)
    }

    /// Names and data of the values of `path`
    pub fn enum_values(&self, path: &str) -> Result<Vec<(String, RegistryValue)>> {
        let key = self.open_key(path)?;
        let mut values = Vec::new();
        for index in 0.. {
            let entry = self.with_data_buffer(BaseRegEnumValue::NAME, |data_capacity| {
                let response = call(
                    &self.transport,
                    &BaseRegEnumValue {
                        key,
                        index,
                        name_capacity: self.config.name_buffer_chars,
                        data_capacity,
                    },
                )?;
                if response.error == Win32Error::NO_MORE_ITEMS {
                    return Ok((None, Win32Error::SUCCESS, None));
                }
                let needed = response.data.data_size;
                Ok((Some((response.name, response.data)), response.error, needed))
            })?;
            let Some((name, data)) = entry else {
                break;
            };
            values.push((name, data.value()?));
        }
        Ok(values)
    }

    /// Data of the value `name` under `path`; an empty name reads the default value
    pub fn query_value(&self, path: &str, name: &str) -> Result<RegistryValue> {
        let key = self.open_key(path)?;
        let data = self.with_data_buffer(BaseRegQueryValue::NAME, |data_capacity| {
            let response = call(
                &self.transport,
                &BaseRegQueryValue {
                    key,
                    value_name: name.to_owned(),
                    data_capacity,
                },
            )?;
            let needed = response.data.data_size;
            Ok((response.data, response.error, needed))
        })?;
        Ok(data.value()?)
    }

    /// Metadata of the key at `path`
    pub fn query_info(&self, path: &str) -> Result<KeyInfo> {
        let key = self.open_key(path)?;
        let response = call(
            &self.transport,
            &BaseRegQueryInfoKey {
                key,
                class_capacity: self.config.name_buffer_chars,
            },
        )?;
        response.error.check(BaseRegQueryInfoKey::NAME)?;
        Ok(response.info)
    }

    /// Run `attempt` with growing data buffers while the server answers
    /// `ERROR_MORE_DATA`, up to the configured ceiling
    ///
    /// `attempt` returns its output, the error code and the size the server
    /// asked for.
    fn with_data_buffer<R, F>(&self, operation: &'static str, mut attempt: F) -> Result<R>
    where
        F: FnMut(u32) -> Result<(R, Win32Error, Option<u32>)>,
    {
        let mut capacity = self.config.initial_data_buffer;
        loop {
            let (output, error, needed) = attempt(capacity)?;
            if error != Win32Error::MORE_DATA {
                error.check(operation)?;
                return Ok(output);
            }

            let next = match needed {
                Some(needed) if needed > capacity => needed,
                _ => capacity.saturating_mul(2),
            };
            if next > self.config.max_data_buffer || next == capacity {
                return Err(RpcError::Win32 { operation, error });
            }
            debug!("{}: retrying with a {} byte buffer", operation, next);
            capacity = next;
        }
    }
}
