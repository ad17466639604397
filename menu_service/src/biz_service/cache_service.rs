use moka::sync::Cache;
use std::time::Duration;

#[derive(Debug)]
pub struct CacheService<T: Clone + Send + Sync + 'static> {
    cache: Cache<String, T>,
}

impl<T: Clone + Send + Sync + 'static> CacheService<T> {
    /// 创建带有 TTL 和最大容量的缓存服务
    pub fn new(ttl_secs: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder().time_to_live(Duration::from_secs(ttl_secs)).max_capacity(max_capacity).build();
        CacheService { cache }
    }

    /// 插入缓存项
    pub fn insert(&self, key: impl ToString, value: T) {
        self.cache.insert(key.to_string(), value);
    }

    /// 获取缓存项
    pub fn get(&self, key: &str) -> Option<T> {
        self.cache.get(key)
    }

    /// 删除缓存项
    pub fn remove(&self, key: &str) {
        self.cache.invalidate(key);
    }

    /// 清除所有缓存
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::CacheService;

    #[test]
    fn insert_get_and_invalidate() {
        let cache: CacheService<i32> = CacheService::new(60, 10);
        cache.insert("a", 1);
        assert_eq!(cache.get("a"), Some(1));
        cache.remove("a");
        assert_eq!(cache.get("a"), None);
        cache.insert("b", 2);
        cache.clear();
        assert_eq!(cache.get("b"), None);
    }
}
