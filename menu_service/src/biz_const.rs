/// 根节点层级
pub const ROOT_LEVEL: i32 = 1;
/// 同级排序号起始值
pub const FIRST_SORT_ORDER: i32 = 1;
